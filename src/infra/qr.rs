//! QR codes rendered as half-block text for the receive screen.

use qrcode::{Color, EcLevel, QrCode};

/// Modules of white border around the code.
const QUIET_ZONE: usize = 2;

/// Render `data` as lines of `▀▄█ ` characters, two module rows per line.
///
/// Returns `None` when the data does not fit in a QR code.
pub fn render_lines(data: &str) -> Option<Vec<String>> {
    let code = QrCode::with_error_correction_level(data, EcLevel::M).ok()?;
    let colors = code.to_colors();
    let width = code.width();
    let total = width + QUIET_ZONE * 2;

    let dark = |x: usize, y: usize| -> bool {
        if x < QUIET_ZONE || y < QUIET_ZONE || x >= width + QUIET_ZONE || y >= width + QUIET_ZONE {
            return false;
        }
        colors[(y - QUIET_ZONE) * width + (x - QUIET_ZONE)] == Color::Dark
    };

    let lines = (0..total)
        .step_by(2)
        .map(|y| {
            (0..total)
                .map(|x| match (dark(x, y), dark(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect();
    Some(lines)
}
