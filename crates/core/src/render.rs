//! Terminal rendering of scan codes.

use std::io::Write;

use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use tracing::warn;

use crate::collaborator::QrRenderer;

/// Draws each scan code as half-block unicode art.
pub struct TerminalQrRenderer<W> {
	out: W,
}

impl TerminalQrRenderer<std::io::Stdout> {
	pub fn stdout() -> Self {
		Self { out: std::io::stdout() }
	}
}

impl<W: Write> TerminalQrRenderer<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}

	pub fn into_inner(self) -> W {
		self.out
	}
}

/// Renders `code` for a dark-on-light terminal; `None` if it cannot be encoded.
pub fn qr_art(code: &str) -> Option<String> {
	let qr = QrCode::new(code.as_bytes()).ok()?;
	Some(
		qr.render::<Dense1x2>()
			.dark_color(Dense1x2::Light)
			.light_color(Dense1x2::Dark)
			.quiet_zone(true)
			.build(),
	)
}

impl<W: Write + Send> QrRenderer for TerminalQrRenderer<W> {
	fn render(&mut self, code: &str) {
		let body = qr_art(code).unwrap_or_else(|| code.to_string());
		let written = writeln!(self.out, "Scan this code with your phone:\n{body}").and_then(|()| self.out.flush());
		if let Err(err) = written {
			warn!(target = "courier", error = %err, "failed to render scan code");
		}
	}
}
