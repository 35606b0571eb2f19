use eframe::egui;

pub struct ScannerPalette {
    pub bg: egui::Color32,
    pub fg: egui::Color32,
    pub stroke: egui::Color32,
    pub scanning: egui::Color32,
    pub idle: egui::Color32,
    pub fault: egui::Color32,
    pub highlight: egui::Color32,
}

impl ScannerPalette {
    pub fn new(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg: egui::Color32::from_rgb(25, 25, 25),
                fg: egui::Color32::WHITE,
                stroke: egui::Color32::WHITE,
                scanning: egui::Color32::from_rgb(0, 255, 127),
                idle: egui::Color32::from_gray(90),
                fault: egui::Color32::from_rgb(255, 80, 80),
                highlight: egui::Color32::from_rgb(255, 200, 0),
            }
        } else {
            Self {
                bg: egui::Color32::from_rgb(245, 245, 245),
                fg: egui::Color32::BLACK,
                stroke: egui::Color32::BLACK,
                scanning: egui::Color32::from_rgb(0, 200, 0),
                idle: egui::Color32::from_gray(100),
                fault: egui::Color32::from_rgb(255, 50, 50),
                highlight: egui::Color32::from_rgb(255, 220, 0),
            }
        }
    }
}

/// Flat, thick-bordered style used by the scanner window.
pub fn apply_theme(ctx: &egui::Context, is_dark: bool) {
    let mut style = (*ctx.style()).clone();
    let palette = ScannerPalette::new(is_dark);

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 26.0,
                egui::TextStyle::Monospace => 20.0,
                egui::TextStyle::Body | egui::TextStyle::Button => 15.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(10.0, 10.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    let widgets = &mut style.visuals.widgets;
    for visuals in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
    ] {
        visuals.rounding = egui::Rounding::ZERO;
        visuals.bg_stroke = egui::Stroke::new(2.0, palette.stroke);
        visuals.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    }
    widgets.noninteractive.bg_fill = palette.bg;
    widgets.inactive.bg_fill = if is_dark {
        egui::Color32::from_gray(30)
    } else {
        egui::Color32::WHITE
    };
    widgets.hovered.bg_fill = palette.highlight;
    widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    widgets.active.bg_fill = palette.scanning;
    widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    style.visuals.window_rounding = egui::Rounding::ZERO;
    style.visuals.window_fill = palette.bg;
    style.visuals.panel_fill = palette.bg;
    style.visuals.override_text_color = Some(palette.fg);

    ctx.set_style(style);
}
