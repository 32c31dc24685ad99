use algoviz::geometry::{Motion, Point, Side};
use algoviz::scene::{Bind, Canvas, CircleSpec, ConnectorKind, ConnectorSpec, PointerSpec};
use algoviz::structures::{CellValue, GenerationKind, PointerSlot, SortMode, StructureOptions};
use algoviz::{Config, RenderOptions, SceneError, Theme, parse_scene, render_scene, render_svg};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn numbers(values: &[i64]) -> Vec<CellValue> {
    values.iter().copied().map(CellValue::from).collect()
}

#[test]
fn bound_arrow_tweens_to_a_moved_node() {
    let mut canvas = Canvas::new(400.0, 300.0);
    let a = canvas.add_circle(CircleSpec::new(Point::new(50.0, 50.0), 10.0)).unwrap();
    let b = canvas.add_circle(CircleSpec::new(Point::new(150.0, 50.0), 10.0)).unwrap();
    let arrow = canvas
        .add_connector(ConnectorSpec::between(ConnectorKind::Arrow, a, Side::Right, Some(b), Side::Left))
        .unwrap();
    assert_eq!(canvas.drawn_segment(arrow).unwrap().end, Point::new(138.0, 50.0));

    canvas.move_node(b, Motion::By { dx: 0.0, dy: 100.0 }).unwrap();
    assert_eq!(canvas.connector(arrow).unwrap().segment().end, Point::new(138.0, 150.0));

    canvas.advance(0.25);
    assert_eq!(canvas.drawn_segment(arrow).unwrap().end, Point::new(138.0, 100.0));

    canvas.settle();
    assert!(!canvas.is_animating());
    assert_eq!(canvas.drawn_segment(arrow).unwrap().end, Point::new(138.0, 150.0));
}

#[test]
fn pointer_to_nothing_renders_crossed() {
    let mut canvas = Canvas::new(400.0, 300.0);
    let target = canvas.add_circle(CircleSpec::new(Point::new(200.0, 50.0), 10.0)).unwrap();
    let pointer = canvas
        .add_pointer(PointerSpec::new(Point::new(20.0, 40.0), 30.0, 10.0, Side::Right).to(Some(target), Side::Left))
        .unwrap();
    canvas.add_root(pointer).unwrap();
    canvas.add_root(target).unwrap();
    assert!(!canvas.pointer_is_null(pointer).unwrap());

    let arrow = canvas.pointer_arrow(pointer).unwrap();
    canvas.bind(arrow, Bind::to_nothing()).unwrap();
    canvas.settle();
    assert!(canvas.pointer_is_null(pointer).unwrap());

    let config = Config::default();
    let svg = render_svg(&canvas, &config.theme, &config.render);
    assert_valid_svg(&svg, "null pointer");
    assert!(svg.contains(&config.theme.cross_color));
}

#[test]
fn list_next_pointer_can_be_redirected() {
    let mut canvas = Canvas::new(640.0, 480.0);
    let options = StructureOptions {
        x: Some(10.0),
        y: Some(10.0),
        size: Some(30.0),
        ..Default::default()
    };
    let list = canvas.add_list(&options, Some(&numbers(&[1, 2, 3]))).unwrap();
    let next = canvas.element_pointer(list, 0, PointerSlot::Next).unwrap();
    let third = canvas.element_node(list, 2).unwrap();

    canvas.bind(next, Bind::to(third, Side::Up)).unwrap();
    canvas.settle();
    let expected = canvas.connection_point(third, Side::Up).unwrap();
    assert_eq!(canvas.drawn_segment(next).unwrap().end, expected);
    assert!(matches!(
        canvas.element_pointer(list, 0, PointerSlot::Left),
        Err(SceneError::NoSuchPointer { .. })
    ));
}

#[test]
fn sorted_values_build_a_search_tree() {
    let mut canvas = Canvas::new(800.0, 600.0);
    let options = StructureOptions {
        radius: Some(12.0),
        kind: Some(GenerationKind::Random),
        num: Some(15),
        max: Some(100),
        sort: Some(SortMode::Sorted),
        ..Default::default()
    };
    let tree = canvas.add_tree(&options, None).unwrap();
    let in_order: Vec<i64> = canvas
        .tree(tree)
        .unwrap()
        .in_order()
        .into_iter()
        .filter_map(CellValue::as_number)
        .collect();
    assert_eq!(in_order.len(), 15);
    assert!(in_order.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn clear_invalidates_handles_and_timers() {
    let mut canvas = Canvas::new(640.0, 480.0);
    let options = StructureOptions {
        radius: Some(10.0),
        ..Default::default()
    };
    let array = canvas.add_array(&options, Some(&numbers(&[3, 1]))).unwrap();
    let node = canvas.element_node(array, 0).unwrap();
    canvas.array_swap(array, 0, 1).unwrap();

    canvas.clear();
    assert!(canvas.timers().is_empty());
    assert!(matches!(canvas.node(node), Err(SceneError::StaleHandle { .. })));
    assert!(matches!(canvas.array(array), Err(SceneError::StaleHandle { .. })));
}

#[test]
fn missing_size_fails_before_anything_is_built() {
    let mut canvas = Canvas::new(640.0, 480.0);
    let options = StructureOptions::default();
    assert_eq!(
        canvas.add_list(&options, Some(&numbers(&[1, 2]))),
        Err(SceneError::MissingOption("size"))
    );
    assert!(canvas.nodes().is_empty());
    assert!(canvas.roots().is_empty());
}

#[test]
fn scene_file_renders_mid_transition_and_settled() {
    let scene = r#"
    {
        width: 500, height: 300,
        structures: [
            { name: "list", kind: "list", options: { x: 20, y: 40, size: 30 }, values: ["a", "b", "c"] },
        ],
        shapes: [
            { shape: "rect", name: "box", x: 20, y: 200, width: 40, height: 20, borderRadius: 4, label: "tmp" },
        ],
        connectors: [
            { name: "link", kind: "curved", from: "box", fromSide: "up", to: { of: "list", index: 1 }, toSide: "down" },
        ],
        steps: [
            [{ op: "move", target: "box", dx: 200 }],
            [{ op: "bind", connector: { of: "list", index: 2, slot: "next" }, to: "box", toSide: "up" }],
        ],
    }
    "#;
    assert!(parse_scene(scene).is_ok());

    let midway = render_scene(
        scene,
        RenderOptions {
            steps: 1,
            at: Some(0.1),
            ..Default::default()
        },
    )
    .unwrap();
    let settled = render_scene(
        scene,
        RenderOptions {
            steps: 2,
            ..Default::default()
        },
    )
    .unwrap();
    assert_valid_svg(&midway, "midway");
    assert_valid_svg(&settled, "settled");
    assert!(settled.contains("viewBox=\"0 0 500 300\""));
    assert!(settled.contains(">tmp<"));
    assert_ne!(midway, settled);
}

#[test]
fn bad_scene_files_are_reported() {
    let err = render_scene("{ steps: [[{ op: \"swap\", target: \"missing\", i: 0, j: 1 }]] }", RenderOptions {
        steps: 1,
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(parse_scene("{ shapes: [{ shape: \"hexagon\" }] }").is_err());
}

#[test]
fn config_file_switches_theme_and_timing() {
    let config = algoviz::config::parse_config(
        r##"{ "theme": "modern", "animation": { "duration": 1.0 }, "themeVariables": { "crossColor": "#FF0000" } }"##,
    )
    .unwrap();
    assert_eq!(config.theme.font_family, Theme::modern().font_family);
    assert_eq!(config.theme.cross_color, "#FF0000");
    assert_eq!(config.animation.duration, 1.0);
    assert_eq!(config.animation.step, 0.5);

    let mut canvas = Canvas::with_config(&config);
    let a = canvas.add_circle(CircleSpec::new(Point::new(0.0, 0.0), 5.0)).unwrap();
    let b = canvas.add_circle(CircleSpec::new(Point::new(100.0, 0.0), 5.0)).unwrap();
    let line = canvas
        .add_connector(ConnectorSpec::between(ConnectorKind::Line, a, Side::Right, Some(b), Side::Left))
        .unwrap();
    canvas.move_node(b, Motion::By { dx: 100.0, dy: 0.0 }).unwrap();
    canvas.advance(0.5);
    assert_eq!(canvas.drawn_segment(line).unwrap().end, Point::new(143.0, 0.0));
}
