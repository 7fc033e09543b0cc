//! Frame-buffer rendering of display messages.
//!
//! [`DisplayState`] is a small board holding the latest line for each data
//! kind. [`FrameSink`] updates the board with every message and redraws it
//! on any `embedded-graphics` monochrome target.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Alignment, Baseline, Text},
};
use heapless::String;
use sensorhub_drivers::DataKind;

use crate::display_task::DisplaySink;
use crate::message::DisplayMessage;

/// One board row per data kind.
pub const BOARD_ROWS: usize = 4;

/// Usable characters per row (21 columns of FONT_6X10 on 128 px).
pub const ROW_CHARS: usize = 21;

// ── DisplayConfig ────────────────────────────────────────────────────────

/// Layout geometry of the frame sink.
///
/// [`DisplayConfig::default()`] fits a 128×64 panel: a title line and four
/// text rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Total display width in pixels. Default: 128.
    pub display_width: u32,
    /// Total display height in pixels. Default: 64.
    pub display_height: u32,
    /// Height reserved for the title at the top. Default: 12.
    pub header_height: u32,
    /// Vertical distance between board rows. Default: 12.
    pub row_height: u32,
    /// Left margin of the board rows. Default: 0.
    pub margin_x: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_width: 128,
            display_height: 64,
            header_height: 12,
            row_height: 12,
            margin_x: 0,
        }
    }
}

impl DisplayConfig {
    /// Top edge of board row `row`.
    pub fn row_y(&self, row: usize) -> i32 {
        self.header_height as i32 + (row as u32 * self.row_height) as i32
    }

    /// Number of board rows that fit below the header.
    pub fn visible_rows(&self) -> usize {
        let free = self.display_height.saturating_sub(self.header_height);
        match self.row_height {
            0 => 0,
            h => ((free / h) as usize).min(BOARD_ROWS),
        }
    }
}

// ── DisplayState ─────────────────────────────────────────────────────────

/// The board: latest text per data kind.
///
/// Rows are null-padded ASCII buffers so the state stays `Copy` and
/// allocation-free.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayState {
    rows: [[u8; ROW_CHARS + 1]; BOARD_ROWS],
    updates: u32,
}

impl DisplayState {
    pub fn row_of(kind: DataKind) -> usize {
        match kind {
            DataKind::Temperature => 0,
            DataKind::Pressure => 1,
            DataKind::Humidity => 2,
            DataKind::AngularRate => 3,
        }
    }

    /// Replace the row for the message's kind.
    pub fn update(&mut self, message: &DisplayMessage) {
        let mut text: String<48> = String::new();
        let readings = &message.readings;
        // Overflow only truncates the row.
        let _ = write!(text, "{}", message.kind.label());
        for sample in readings.samples() {
            let _ = write!(text, " {:.1}", sample);
        }
        let _ = write!(text, " {}", readings.unit().symbol());

        let row = &mut self.rows[Self::row_of(message.kind)];
        *row = [0; ROW_CHARS + 1];
        let bytes = text.as_bytes();
        let len = bytes.len().min(ROW_CHARS);
        row[..len].copy_from_slice(&bytes[..len]);
        self.updates = self.updates.wrapping_add(1);
    }

    /// Text of a row, empty until the first message of that kind.
    pub fn row(&self, row: usize) -> &str {
        self.rows.get(row).map_or("", |r| Self::bytes_to_str(r))
    }

    /// Messages applied to this board.
    pub fn updates(&self) -> u32 {
        self.updates
    }

    /// Convert a fixed-size null-padded byte array back to a `&str`.
    pub fn bytes_to_str(bytes: &[u8]) -> &str {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..end]).unwrap_or("")
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Draw the board.
///
/// ```text
/// ┌───────────────────────┐
/// │       SensorHub       │  ← header_height
/// │ Temp 23.5 C           │  row 0
/// │ Pres 101325.0 Pa      │  row 1
/// │ Hum 40.0 %RH          │  row 2
/// │ Gyro 1.5 -0.5 0.0 dps │  row 3
/// └───────────────────────┘
/// ```
pub fn render_display<D>(
    display: &mut D,
    state: &DisplayState,
    config: &DisplayConfig,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    let centre_x = config.display_width as i32 / 2;
    Text::with_alignment(
        "SensorHub",
        Point::new(centre_x, config.header_height as i32 - 2),
        text_style,
        Alignment::Center,
    )
    .draw(display)?;

    for row in 0..config.visible_rows() {
        let text = state.row(row);
        if text.is_empty() {
            continue;
        }
        Text::with_baseline(
            text,
            Point::new(config.margin_x, config.row_y(row)),
            text_style,
            Baseline::Top,
        )
        .draw(display)?;
    }

    Ok(())
}

// ── FrameSink ────────────────────────────────────────────────────────────

/// A [`DisplaySink`] redrawing the whole board on every message.
pub struct FrameSink<D> {
    display: D,
    state: DisplayState,
    config: DisplayConfig,
}

impl<D> FrameSink<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(display: D, config: DisplayConfig) -> Self {
        Self {
            display,
            state: DisplayState::default(),
            config,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn into_inner(self) -> D {
        self.display
    }
}

impl<D> DisplaySink for FrameSink<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: core::fmt::Debug,
{
    type Error = D::Error;

    fn render(&mut self, message: &DisplayMessage) -> Result<(), D::Error> {
        self.state.update(message);
        self.display.clear(BinaryColor::Off)?;
        render_display(&mut self.display, &self.state, &self.config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TaskId;
    use embedded_graphics::mock_display::MockDisplay;
    use sensorhub_drivers::Readings;

    fn message(kind: DataKind, samples: &[f32]) -> DisplayMessage {
        let mut readings = Readings::new(kind);
        readings.overwrite(kind, 0, samples);
        DisplayMessage::new(TaskId(1), 0, readings)
    }

    #[test]
    fn default_state_is_blank() {
        let state = DisplayState::default();
        for row in 0..BOARD_ROWS {
            assert_eq!(state.row(row), "");
        }
        assert_eq!(state.row(BOARD_ROWS), "");
    }

    #[test]
    fn update_fills_row_for_kind() {
        let mut state = DisplayState::default();
        state.update(&message(DataKind::Humidity, &[40.04]));
        state.update(&message(DataKind::AngularRate, &[1.5, -0.5, 0.0]));
        assert_eq!(state.row(2), "Hum 40.0 %RH");
        assert_eq!(state.row(3), "Gyro 1.5 -0.5 0.0 dps");
        assert_eq!(state.row(0), "");
        assert_eq!(state.updates(), 2);
    }

    #[test]
    fn update_truncates_long_rows() {
        let mut state = DisplayState::default();
        state.update(&message(DataKind::AngularRate, &[-1000.0, -2000.0, -3000.0]));
        assert_eq!(state.row(3).len(), ROW_CHARS);
        assert!(state.row(3).starts_with("Gyro -1000.0"));
    }

    #[test]
    fn bytes_to_str_handles_null_padding() {
        let mut buf = [0u8; 8];
        buf[0] = b'H';
        buf[1] = b'i';
        assert_eq!(DisplayState::bytes_to_str(&buf), "Hi");
    }

    #[test]
    fn default_config_fits_all_rows() {
        let c = DisplayConfig::default();
        assert_eq!(c.visible_rows(), BOARD_ROWS);
        assert_eq!(c.row_y(0), 12);
        assert_eq!(c.row_y(3), 48);
    }

    #[test]
    fn short_display_hides_rows() {
        let c = DisplayConfig {
            display_height: 32,
            ..DisplayConfig::default()
        };
        assert_eq!(c.visible_rows(), 1);
    }

    #[test]
    fn frame_sink_draws_rows() {
        let mut display: MockDisplay<BinaryColor> = MockDisplay::new();
        display.set_allow_out_of_bounds_drawing(true);
        display.set_allow_overdraw(true);

        let config = DisplayConfig {
            display_width: 64,
            ..DisplayConfig::default()
        };
        let mut sink = FrameSink::new(display, config);
        sink.render(&message(DataKind::Temperature, &[23.5])).unwrap();
        assert_eq!(sink.state().row(0), "Temp 23.5 C");

        let display = sink.into_inner();
        let row_lit = (0..64).any(|x| {
            (12..22).any(|y| display.get_pixel(Point::new(x, y)) == Some(BinaryColor::On))
        });
        assert!(row_lit);
        let last_row_lit = (0..64).any(|x| {
            (48..58).any(|y| display.get_pixel(Point::new(x, y)) == Some(BinaryColor::On))
        });
        assert!(!last_row_lit);
    }
}
