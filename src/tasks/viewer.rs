use std::io::{self, Write};

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

use crate::events::{ArtworkRecord, FrameUpdate};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_CREDIT_LINE: &str = "Unknown Credit Line";
const UNKNOWN_DATE: &str = "Unknown Date";

/// Render-ready text fields with the literal fallbacks substituted.
#[derive(Debug, PartialEq, Eq)]
pub struct DisplayFields {
    pub title: String,
    pub artist: String,
    pub credit_line: String,
    pub date: String,
}

/// Title and artist are trimmed before the emptiness check; credit line and
/// date are taken as-is.
pub fn display_fields(record: &ArtworkRecord) -> DisplayFields {
    let title = record.title.trim();
    let artist = record.artist.trim();
    DisplayFields {
        title: if title.is_empty() {
            UNKNOWN_TITLE.to_string()
        } else {
            title.to_string()
        },
        artist: if artist.is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            artist.to_string()
        },
        credit_line: if record.credit_line.is_empty() {
            UNKNOWN_CREDIT_LINE.to_string()
        } else {
            record.credit_line.clone()
        },
        date: if record.date.is_empty() {
            UNKNOWN_DATE.to_string()
        } else {
            record.date.clone()
        },
    }
}

/// Console rendition of the display surface: an artwork card, a live
/// countdown line, the loading indicator and the underrun notice.
pub async fn run(mut from_gallery: Receiver<FrameUpdate>, cancel: CancellationToken) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            Some(update) = from_gallery.recv() => render(update),
            else => break,
        }
    }
    println!();
    Ok(())
}

fn render(update: FrameUpdate) {
    match update {
        FrameUpdate::Show(record) => {
            let fields = display_fields(&record);
            println!();
            println!("{}", fields.title);
            println!("  {} ({})", fields.artist, fields.date);
            println!("  {}", fields.credit_line);
            println!("  {}", record.image_url);
        }
        FrameUpdate::Countdown(secs) => {
            print!("\rnext artwork in {secs:>3}s");
            let _ = io::stdout().flush();
        }
        FrameUpdate::Loading(true) => println!("fetching artwork..."),
        FrameUpdate::Loading(false) => {}
        FrameUpdate::Underrun => {
            println!();
            println!("could not load the next artwork in time; starting over");
        }
    }
}
