//! OpenSCAD serialization of a CSG [`Node`] tree.
//!
//! Produces plain `.scad` source that OpenSCAD (or any slicer pipeline built
//! on it) can render. Numbers are written with Rust's shortest round-trip
//! formatting so no precision is lost.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::scene::Node;

const INDENT: &str = "    ";

/// Render a node tree as OpenSCAD source.
///
/// # Example
/// ```
/// use activity_skyline::scad::to_scad;
/// use activity_skyline::scene::Node;
///
/// let src = to_scad(&Node::cube(1.0, 2.0, 0.5).translate(0.0, 0.0, 0.2));
/// assert!(src.contains("translate(v = [0, 0, 0.2])"));
/// assert!(src.contains("cube(size = [1, 2, 0.5]);"));
/// ```
pub fn to_scad(node: &Node) -> String {
    let mut out = String::new();
    out.push_str("// Generated by activity-skyline\n\n");
    write_node(&mut out, node, 0);
    out
}

/// Write a node tree as OpenSCAD source, creating parent directories and
/// replacing any existing file.
pub fn write_scad(node: &Node, path: &Path) -> Result<()> {
    write_output(path, &to_scad(node), "OpenSCAD file with text")
}

/// Write generated text to `path`, creating parent directories and replacing
/// any existing file. `what` names the output in the log line.
pub(crate) fn write_output(path: &Path, contents: &str, what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    info!("[Skyline] {} saved as {}", what, path.display());
    Ok(())
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Cube { size } => {
            let _ = writeln!(out, "{}cube(size = {});", pad, vec3(size));
        }
        Node::Text { text, size, halign } => {
            let _ = writeln!(
                out,
                "{}text(text = \"{}\", size = {}, halign = \"{}\");",
                pad,
                escape(text),
                num(*size),
                halign.as_str()
            );
        }
        Node::LinearExtrude { height, child } => {
            let header = format!("linear_extrude(height = {})", num(*height));
            write_block(out, &pad, &header, &[child.as_ref()], depth);
        }
        Node::Translate { offset, child } => {
            let header = format!("translate(v = {})", vec3(offset));
            write_block(out, &pad, &header, &[child.as_ref()], depth);
        }
        Node::Rotate { angles, child } => {
            let header = format!("rotate(a = {})", vec3(angles));
            write_block(out, &pad, &header, &[child.as_ref()], depth);
        }
        Node::Scale { factors, child } => {
            let header = format!("scale(v = {})", vec3(factors));
            write_block(out, &pad, &header, &[child.as_ref()], depth);
        }
        Node::Hull { children } => {
            let children: Vec<&Node> = children.iter().collect();
            write_block(out, &pad, "hull()", &children, depth);
        }
        Node::Union { children } => {
            let children: Vec<&Node> = children.iter().collect();
            write_block(out, &pad, "union()", &children, depth);
        }
    }
}

fn write_block(out: &mut String, pad: &str, header: &str, children: &[&Node], depth: usize) {
    let _ = writeln!(out, "{}{} {{", pad, header);
    for child in children {
        write_node(out, child, depth + 1);
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn num(value: f64) -> String {
    // Avoid "-0" in the output
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

fn vec3(v: &[f64; 3]) -> String {
    format!("[{}, {}, {}]", num(v[0]), num(v[1]), num(v[2]))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HAlign;

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(2.0), "2");
        assert_eq!(num(-0.01), "-0.01");
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(0.75), "0.75");
        assert_eq!(vec3(&[1.5, -0.03, 20.0]), "[1.5, -0.03, 20]");
    }

    #[test]
    fn test_text_escaping() {
        let src = to_scad(&Node::text("Say \"hi\" \\ bye", 1.5, HAlign::Left));
        assert!(src.contains(r#"text(text = "Say \"hi\" \\ bye", size = 1.5, halign = "left");"#));
    }

    #[test]
    fn test_nested_blocks_are_balanced() {
        let tree = Node::union(vec![
            Node::hull(vec![
                Node::cube(3.0, 2.0, 0.1).translate(0.75, 0.75, -0.01),
                Node::cube(4.5, 3.5, 0.1).translate(0.0, 0.0, -3.0),
            ]),
            Node::text("2024", 1.5, HAlign::Right)
                .linear_extrude(1.0)
                .rotate(75.96, 0.0, 0.0)
                .translate(1.0, 0.75, -2.25),
        ])
        .scale_uniform(2.0);

        let src = to_scad(&tree);
        assert_eq!(src.matches('{').count(), src.matches('}').count());
        assert!(src.contains("scale(v = [2, 2, 2]) {"));
        assert!(src.contains("    union() {"));
        assert!(src.contains("hull() {"));
        assert!(src.contains("rotate(a = [75.96, 0, 0]) {"));
        assert!(src.contains("linear_extrude(height = 1) {"));

        // translate wraps rotate wraps extrude
        let t = src.find("translate(v = [1, 0.75, -2.25])").unwrap();
        let r = src.find("rotate(a = [75.96, 0, 0])").unwrap();
        let e = src.find("linear_extrude(height = 1)").unwrap();
        assert!(t < r && r < e);
    }

    #[test]
    fn test_write_creates_parent_dirs_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("model.scad");

        write_scad(&Node::cube(1.0, 1.0, 1.0), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("cube(size = [1, 1, 1]);"));

        write_scad(&Node::cube(2.0, 2.0, 2.0), &path).unwrap();
        let src = fs::read_to_string(&path).unwrap();
        assert!(src.contains("cube(size = [2, 2, 2]);"));
        assert!(!src.contains("cube(size = [1, 1, 1]);"));
    }

    #[test]
    fn test_write_output_replaces_file() {
        let dir = tempfile::tempdir().unwrap();

        // A bare file name has an empty parent; nothing to create
        let bare = Path::new("model.json");
        assert_eq!(bare.parent(), Some(Path::new("")));

        let path = dir.path().join(bare);
        write_output(&path, "{}", "Scene JSON").unwrap();
        write_output(&path, "[]", "Scene JSON").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
