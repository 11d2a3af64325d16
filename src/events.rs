/// One artwork, resolved and ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRecord {
    pub image_url: String,
    pub title: String,
    pub artist: String,
    pub date: String,
    pub credit_line: String,
}

/// Gallery -> Fetcher: pull one more random artwork.
#[derive(Debug)]
pub struct FetchRequest;

/// Fetcher -> Gallery: the explicit result of one prefetch pass.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(ArtworkRecord),
    /// Every attempt in the retry budget was spent without a usable record.
    Exhausted { attempts: u32 },
}

/// Gallery -> Viewer: display surface updates.
#[derive(Debug)]
pub enum FrameUpdate {
    Show(ArtworkRecord),
    Countdown(u64),
    Loading(bool),
    /// The swap tick found nothing prefetched; the gallery is reseeding.
    Underrun,
}

/// Host -> Gallery: detail overlay state. The countdown freezes while open.
#[derive(Debug)]
pub enum OverlayEvent {
    Opened,
    Closed,
}
