use crate::config::RenderConfig;
use crate::scene::{Canvas, Connector, ConnectorKind, Node, ShapeKind, ShapeStyle};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Draws the canvas as it looks at the current logical time.
///
/// Connectors are drawn first, then nodes in creation order, then raised
/// nodes on top. Connectors pointing to nothing are skipped; hidden
/// elements are drawn fully transparent (or omitted when `keep_hidden` is
/// off).
pub fn render_svg(canvas: &Canvas, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let pad = config.padding.max(0.0);
    let width = canvas.width() + 2.0 * pad;
    let height = canvas.height() + 2.0 * pad;
    let origin = if pad > 0.0 { -pad } else { 0.0 };

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{origin} {origin} {width} {height}\">"
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str(&highlight_styles(theme));
    svg.push_str("</defs>");

    svg.push_str(&format!(
        "<rect x=\"{origin}\" y=\"{origin}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));

    for connector in canvas.connectors() {
        if !connector.is_displayed() || (!connector.is_shown() && !config.keep_hidden) {
            continue;
        }
        svg.push_str(&connector_svg(canvas, connector, theme, config));
    }

    let (raised, flat): (Vec<&Node>, Vec<&Node>) = canvas.nodes().iter().partition(|node| node.is_raised());
    for node in flat.into_iter().chain(raised) {
        if !node.is_shown() && !config.keep_hidden {
            continue;
        }
        svg.push_str(&node_svg(canvas, node, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn highlight_styles(theme: &Theme) -> String {
    let mut style = String::from("<style>");
    for (tag, color) in &theme.highlight_colors {
        style.push_str(&format!(
            ".highlight-{tag} > circle, .highlight-{tag} > rect {{ fill: {color}; }} path.highlight-{tag} {{ stroke: {color}; }}"
        ));
    }
    style.push_str("</style>");
    style
}

fn class_attr(classes: &[String], highlight: Option<&str>) -> String {
    let mut names: Vec<String> = classes.to_vec();
    if let Some(tag) = highlight {
        names.push(format!("highlight-{tag}"));
    }
    if names.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape_xml(&names.join(" ")))
    }
}

fn paint<'a>(style: &'a ShapeStyle, theme: &'a Theme, config: &RenderConfig) -> (&'a str, &'a str, f32) {
    (
        style.fill.as_deref().unwrap_or(&theme.primary_color),
        style.stroke.as_deref().unwrap_or(&theme.primary_border_color),
        style.stroke_width.unwrap_or(config.stroke_width),
    )
}

fn connector_svg(canvas: &Canvas, connector: &Connector, theme: &Theme, config: &RenderConfig) -> String {
    let d = match connector.kind() {
        ConnectorKind::Curved => canvas
            .drawn_path(connector.id())
            .unwrap_or_else(|_| connector.path())
            .to_svg_d(),
        ConnectorKind::Line | ConnectorKind::Arrow => {
            let segment = canvas
                .drawn_segment(connector.id())
                .unwrap_or_else(|_| connector.segment());
            format!(
                "M {:.2} {:.2} L {:.2} {:.2}",
                segment.start.x, segment.start.y, segment.end.x, segment.end.y
            )
        }
    };
    let stroke = connector.style().stroke.as_deref().unwrap_or(&theme.line_color);
    let stroke_width = connector.style().stroke_width.unwrap_or(config.stroke_width);
    let marker = if connector.kind().has_head() {
        " marker-end=\"url(#arrow)\""
    } else {
        ""
    };
    let opacity = if connector.is_shown() { "" } else { " opacity=\"0\"" };
    format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"{}{marker}{opacity}/>",
        class_attr(connector.classes(), connector.highlight())
    )
}

fn node_svg(canvas: &Canvas, node: &Node, theme: &Theme, config: &RenderConfig) -> String {
    let mut out = String::new();
    let lift = if node.lift() != 0.0 {
        format!(" transform=\"translate(0 {:.2})\"", node.lift())
    } else {
        String::new()
    };
    let opacity = if node.is_shown() { "" } else { " opacity=\"0\"" };
    out.push_str(&format!(
        "<g{}{lift}{opacity}>",
        class_attr(node.classes(), node.highlight())
    ));

    let (fill, stroke, stroke_width) = paint(node.style(), theme, config);
    let pos = node.position();
    match node.shape() {
        ShapeKind::Circle { radius } => {
            out.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
                pos.x, pos.y
            ));
            if let Some(label) = node.label() {
                out.push_str(&centered_label(pos.x, pos.y, label, theme));
            }
        }
        ShapeKind::Rect {
            width,
            height,
            corner_radius,
        } => {
            out.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{corner_radius:.2}\" ry=\"{corner_radius:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
                pos.x, pos.y
            ));
            if let Some(label) = node.label() {
                out.push_str(&centered_label(pos.x + width / 2.0, pos.y + height / 2.0, label, theme));
            }
        }
        ShapeKind::Pointer { width, height, arrow } => {
            out.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
                pos.x, pos.y
            ));
            let null = !canvas.connector(*arrow).is_ok_and(|arrow| arrow.is_displayed());
            if null {
                let (x2, y2) = (pos.x + width, pos.y + height);
                for (a, b, c, d) in [(pos.x, pos.y, x2, y2), (x2, pos.y, pos.x, y2)] {
                    out.push_str(&format!(
                        "<line x1=\"{a:.2}\" y1=\"{b:.2}\" x2=\"{c:.2}\" y2=\"{d:.2}\" stroke=\"{}\" stroke-width=\"{stroke_width}\"/>",
                        theme.cross_color
                    ));
                }
            }
        }
        ShapeKind::Text { lines } => {
            out.push_str(&text_lines_svg(pos.x, pos.y, lines, theme));
        }
    }

    out.push_str("</g>");
    out
}

fn centered_label(x: f32, y: f32, label: &str, theme: &Theme) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.primary_text_color,
        escape_xml(label)
    )
}

fn text_lines_svg(x: f32, y: f32, lines: &[String], theme: &Theme) -> String {
    let mut text = String::new();
    text.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        y + theme.font_size,
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.primary_text_color
    ));
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { theme.font_size * 1.2 };
        text.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>", escape_xml(line)));
    }
    text.push_str("</text>");
    text
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
