//! End-to-end label scenarios.
//!
//! These drive `TextLabel` through its public API with a deterministic
//! face and check the emitted lines, quads and dimensions.

mod common;

use std::rc::Rc;

use common::FixedFace;
use glyphlabel_text::layout::{break_lines, measure, tokenize, VERTICES_PER_GLYPH};
use glyphlabel_text::{
    shared, Alignment, FontFace, LabelConfig, LabelFlags, Rasterizer, TextLabel, Vertex,
};

const EPS: f32 = 1e-4;

fn config(text: &str) -> LabelConfig {
    LabelConfig {
        text: text.into(),
        ..LabelConfig::default()
    }
}

fn label(config: &LabelConfig) -> TextLabel<FixedFace> {
    TextLabel::from_config(shared(FixedFace::new()), config).unwrap()
}

/// Clip-space x back to window pixels for an 800px wide window.
fn to_pixels(clip_x: f32) -> f32 {
    (clip_x + 1.0) * 400.0
}

fn x_extent(vertices: &[Vertex]) -> (f32, f32) {
    vertices.iter().fold((f32::MAX, f32::MIN), |(lo, hi), v| {
        (lo.min(to_pixels(v.x)), hi.max(to_pixels(v.x)))
    })
}

#[test]
fn test_hi_is_one_line_of_two_quads() {
    let label = label(&config("Hi"));

    assert_eq!(label.pixel_size(), 48);
    assert_eq!(label.lines().len(), 1);
    assert_eq!(label.vertices().len(), 2 * VERTICES_PER_GLYPH);

    // 'H' 24 + kerning(H, i) -2 + 'i' 12.
    assert_eq!(label.lines()[0].advance, 34.0);

    // The 'i' quad starts where the kerned pen left off.
    let i_left = to_pixels(label.vertices()[VERTICES_PER_GLYPH].x);
    assert!((i_left - 22.0).abs() < EPS);
}

#[test]
fn test_wrap_keeps_trailing_space_on_first_line() {
    let mut label = label(&config("aa bb cc"));
    let max_width = label.measure("aa bb");
    label.set_max_size(max_width, 0.0).unwrap();

    let lines: Vec<&str> = label.lines().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, vec!["aa bb ", "cc"]);
    assert_eq!(label.current_width(), label.measure("aa bb "));
}

#[test]
fn test_max_height_of_one_line_keeps_first_line() {
    let mut cfg = config("aa bb cc");
    cfg.max_width = 1.0;
    let unconstrained = label(&cfg);
    assert_eq!(unconstrained.lines().len(), 3);

    let line_height = unconstrained.atlas().line_height();
    cfg.max_height = line_height;
    let truncated = label(&cfg);

    assert_eq!(truncated.lines().len(), 1);
    assert_eq!(truncated.lines()[0].text, "aa ");
    assert_eq!(truncated.current_height(), line_height);
    assert_eq!(truncated.vertices().len(), 2 * VERTICES_PER_GLYPH);
}

#[test]
fn test_distinct_sizes_get_distinct_atlases() {
    let mut label = label(&config("atlas"));
    let a24 = label.ensure_atlas(24).unwrap();
    let a36 = label.ensure_atlas(36).unwrap();

    assert!(!Rc::ptr_eq(&a24, &a36));
    assert_eq!(a24.pixel_size(), 24);
    assert_eq!(a36.pixel_size(), 36);
    assert!(Rc::ptr_eq(&a24, &label.ensure_atlas(24).unwrap()));
    assert_eq!(label.cached_atlas_count(), 3);
}

#[test]
fn test_unbounded_width_is_one_line() {
    let text = "a long sentence that would wrap if it were allowed to";
    let label = label(&config(text));
    let words = tokenize(text);

    assert_eq!(words.concat(), text);
    let lines = break_lines(&words, 0.0, |w| measure(label.atlas(), w, 1.0));
    assert_eq!(lines, vec![text.to_string()]);
    assert_eq!(label.lines().len(), 1);
}

#[test]
fn test_line_breaking_is_deterministic() {
    let mut cfg = config("the quick brown fox jumps over the lazy dog");
    cfg.max_width = 200.0;
    let first = label(&cfg);
    let second = label(&cfg);

    assert!(first.lines().len() > 1);
    assert_eq!(first.lines(), second.lines());
    assert_eq!(first.vertices(), second.vertices());
}

#[test]
fn test_center_alignment_is_symmetric_about_anchor() {
    let mut cfg = config("HHH");
    cfg.x = 400.0;
    cfg.alignment = Alignment::Center;
    let label = label(&cfg);

    let (lo, hi) = x_extent(label.vertices());
    assert!(((lo + hi) / 2.0 - 400.0).abs() < EPS);
    assert!((hi - lo - label.current_width()).abs() < EPS);
}

#[test]
fn test_right_alignment_ends_at_anchor() {
    let mut cfg = config("HHH");
    cfg.x = 600.0;
    cfg.alignment = Alignment::Right;
    let label = label(&cfg);

    let (_, hi) = x_extent(label.vertices());
    assert!((hi - 600.0).abs() < EPS);
}

#[test]
fn test_spaces_advance_without_quads() {
    let solid = label(&config("HH"));
    let spaced = label(&config("H   H"));

    assert_eq!(spaced.vertices().len(), solid.vertices().len());
    let gap = to_pixels(spaced.vertices()[VERTICES_PER_GLYPH].x)
        - to_pixels(solid.vertices()[VERTICES_PER_GLYPH].x);
    assert!((gap - 36.0).abs() < EPS);
}

#[test]
fn test_color_and_rotation_do_not_relayout() {
    let mut cfg = config("presentation only");
    cfg.max_width = 150.0;
    let mut label = label(&cfg);
    let vertices = label.vertices().to_vec();
    let size = (label.current_width(), label.current_height());

    label.set_color([0.2, 0.4, 0.6, 1.0]);
    label.rotate(90.0, [0.0, 0.0, 1.0]);

    assert_eq!(label.vertices(), vertices.as_slice());
    assert_eq!((label.current_width(), label.current_height()), size);
    assert_eq!(label.color(), [0.2, 0.4, 0.6, 1.0]);
}

#[test]
fn test_indent_skipped_when_centered() {
    let mut cfg = config("aa bb cc");
    cfg.flags = LabelFlags::WORD_WRAP | LabelFlags::INDENTED;
    cfg.max_width = 60.0;
    let mut label = label(&cfg);

    assert_eq!(label.lines()[0].origin_x, 48.0);
    assert_eq!(label.lines()[1].origin_x, 0.0);

    label.set_alignment(Alignment::Center).unwrap();
    let first = &label.lines()[0];
    assert_eq!(first.origin_x, -first.width / 2.0);
}

#[test]
fn test_json_config_round_trip_into_label() {
    let json = r#"{ "text": "AV", "pixel_size": 20, "alignment": "right", "x": 100 }"#;
    let cfg = LabelConfig::from_json(json).unwrap();
    let label = label(&cfg);

    assert_eq!(label.alignment(), Alignment::Right);
    assert_eq!(label.atlas().pixel_size(), 20);
    // 'A' 10 + kerning(A, V) -3 + 'V' 10.
    assert_eq!(label.lines()[0].advance, 17.0);
    assert_eq!(label.face().borrow().pixel_size(), 20);
}

#[test]
fn test_system_font_label() {
    // Skip on hosts without fonts.
    let Ok(face) = FontFace::from_system("sans-serif") else {
        return;
    };
    let mut label = TextLabel::from_config(face.into_shared(), &config("Hello, world")).unwrap();

    assert_eq!(label.lines().len(), 1);
    // 11 inked glyphs; the space has no bitmap.
    assert_eq!(label.vertices().len(), 11 * VERTICES_PER_GLYPH);
    assert!(label.current_width() > 0.0);

    let width = label.measure("Hello,");
    label.set_max_size(width, 0.0).unwrap();
    assert_eq!(label.lines().len(), 2);
    assert!(label.vertices().iter().all(|v| v.s >= 0.0 && v.s <= 1.0 + EPS));
}
