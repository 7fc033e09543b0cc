//! The display task: the single consumer of display messages.
//!
//! Messages are taken from the queue one at a time, in FIFO order, and
//! handed to a [`DisplaySink`]. A failed render is logged and the task
//! moves on to the next message.

use core::fmt::{self, Write};

use embassy_sync::channel::DynamicReceiver;
use heapless::String;

use crate::fmt::Debugged;
use crate::message::DisplayMessage;

/// Longest line [`format_message`] produces.
pub const LINE_CAPACITY: usize = 64;

/// Output device of the display task.
pub trait DisplaySink {
    type Error: fmt::Debug;

    /// Present one message.
    fn render(&mut self, message: &DisplayMessage) -> Result<(), Self::Error>;
}

/// Format a message as a single line of text.
///
/// ```text
/// [t1 #4] Temp ch0: 23.50 C
/// [t2 #0] Gyro: 1.25 -0.50 0.00 dps
/// ```
pub fn format_message(message: &DisplayMessage) -> Result<String<LINE_CAPACITY>, fmt::Error> {
    let mut line = String::new();
    let readings = &message.readings;
    write!(line, "[t{} #{}] {}", message.source.0, message.sequence, message.kind.label())?;
    if readings.samples().len() == 1 {
        write!(line, " ch{}:", readings.channel())?;
    } else {
        line.push(':').map_err(|_| fmt::Error)?;
    }
    for sample in readings.samples() {
        write!(line, " {:.2}", sample)?;
    }
    write!(line, " {}", readings.unit().symbol())?;
    Ok(line)
}

/// A sink writing one formatted line per message.
pub struct TextSink<W> {
    out: W,
    lines: u32,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Lines written so far.
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TextSink<W> {
    type Error = fmt::Error;

    fn render(&mut self, message: &DisplayMessage) -> Result<(), fmt::Error> {
        let line = format_message(message)?;
        writeln!(self.out, "{}", line)?;
        self.lines += 1;
        Ok(())
    }
}

/// Task body: receive and render forever.
pub async fn display_task<S: DisplaySink>(inbox: DynamicReceiver<'_, DisplayMessage>, mut sink: S) {
    info!("display task started");
    loop {
        let message = inbox.receive().await;
        if let Err(e) = sink.render(&message) {
            error!(
                "display: render of #{} from task {} failed: {}",
                message.sequence,
                message.source.0,
                Debugged(&e)
            );
        }
    }
}
