//! ASCII startup banner with a color gradient (KEEPER).

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::ExecutableCommand;
use figlet_rs::FIGfont;
use std::io::{stdout, Write};

/// Deep Teal (#0f766e).
const DEEP_TEAL: (u8, u8, u8) = (0x0f, 0x76, 0x6e);
/// Amber (#f59e0b).
const AMBER: (u8, u8, u8) = (0xf5, 0x9e, 0x0b);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints "KEEPER" in figlet's standard font with a teal-to-amber gradient,
/// then the version line.
pub fn print_welcome() {
    let mut out = stdout();
    let Ok(font) = FIGfont::standard() else {
        return;
    };
    let Some(figure) = font.convert("KEEPER") else {
        return;
    };
    let art = figure.to_string();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(DEEP_TEAL, AMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: AMBER.0,
        g: AMBER.1,
        b: AMBER.2,
    }));
    let _ = out.execute(Print(format!("account-keeper v{}\r\n", version)));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
