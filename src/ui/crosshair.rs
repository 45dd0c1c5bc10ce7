use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
};

use crate::aim::CursorPosition;

/// Narrow sink for high-frequency crosshair moves. Pointer motion lands here
/// instead of going through a full state update.
pub trait CrosshairSurface {
    fn place(&mut self, pos: CursorPosition);
}

/// Crosshair drawn as the last layer over the aiming play area
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosshairLayer {
    position: CursorPosition,
}

impl CrosshairSurface for CrosshairLayer {
    fn place(&mut self, pos: CursorPosition) {
        self.position = pos;
    }
}

impl CrosshairLayer {
    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// Terminal cell under the crosshair, clamped into `area`
    pub fn cell(&self, area: Rect) -> (u16, u16) {
        let col = (self.position.x / 100.0 * area.width as f64).floor() as u16;
        let row = (self.position.y / 100.0 * area.height as f64).floor() as u16;
        (
            area.x + col.min(area.width.saturating_sub(1)),
            area.y + row.min(area.height.saturating_sub(1)),
        )
    }

    pub fn draw(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let (x, y) = self.cell(area);
        let arm = Style::default().fg(Color::Yellow);

        let arms = [
            (x.checked_sub(1), Some(y), "─"),
            (x.checked_add(1), Some(y), "─"),
            (Some(x), y.checked_sub(1), "│"),
            (Some(x), y.checked_add(1), "│"),
        ];
        for (ax, ay, symbol) in arms {
            if let (Some(ax), Some(ay)) = (ax, ay) {
                if area.contains((ax, ay).into()) {
                    if let Some(cell) = buf.cell_mut((ax, ay)) {
                        cell.set_symbol(symbol).set_style(arm);
                    }
                }
            }
        }

        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol("┼")
                .set_style(arm.add_modifier(Modifier::BOLD));
        }
    }
}
