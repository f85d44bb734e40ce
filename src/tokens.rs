//! Advisory token budget tracking.
//!
//! Transcription backends bill streamed audio and images in tokens. The
//! tracker keeps a one-minute sliding window of cost entries and answers
//! "should the orchestrator throttle?" - it never drops or delays data
//! itself.

use std::time::{Duration, Instant};

/// Tokens accrued per second of streamed audio.
const AUDIO_TOKENS_PER_SECOND: f64 = 16.0;

/// Flat cost for images at or below the base resolution.
const IMAGE_BASE_TOKENS: u64 = 85;

/// Images at or below this pixel count cost the flat base rate.
const IMAGE_BASE_PIXELS: u64 = 384 * 384;

/// Pixels per high-resolution tile.
const IMAGE_TILE_PIXELS: u64 = 768 * 768;

/// Length of the sliding cost window.
const WINDOW: Duration = Duration::from_secs(60);

/// What a cost entry was charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Streamed audio, charged by wall time.
    Audio,
    /// A captured image, charged by resolution.
    Image,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    timestamp: Instant,
    count: u64,
    #[allow(dead_code)] // kept for per-kind breakdowns in diagnostics
    kind: TokenKind,
}

/// Sliding one-minute window of transcription cost.
///
/// Audio cost accrues at a fixed rate per second of elapsed wall time
/// between [`track_audio_tokens`](Self::track_audio_tokens) calls; image
/// cost uses a tiling model based on resolution. [`should_throttle`]
/// (Self::should_throttle) is purely advisory.
///
/// # Example
///
/// ```
/// use echo_capture::TokenBudgetTracker;
///
/// let mut tracker = TokenBudgetTracker::new();
/// tracker.add_image_tokens(1920, 1080);
/// assert!(!tracker.should_throttle(500_000, 75));
/// ```
#[derive(Debug, Default)]
pub struct TokenBudgetTracker {
    entries: Vec<TokenEntry>,
    audio_anchor: Option<Instant>,
}

impl TokenBudgetTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` tokens of the given kind at the current time.
    pub fn add_tokens(&mut self, count: u64, kind: TokenKind) {
        self.add_tokens_at(count, kind, Instant::now());
    }

    fn add_tokens_at(&mut self, count: u64, kind: TokenKind, now: Instant) {
        self.entries.push(TokenEntry {
            timestamp: now,
            count,
            kind,
        });
        self.prune(now);
    }

    /// Computes the token cost of an image from its resolution.
    ///
    /// Small images cost a flat rate; larger images cost per 768x768 tile.
    pub fn calculate_image_tokens(width: u32, height: u32) -> u64 {
        let pixels = u64::from(width) * u64::from(height);
        if pixels <= IMAGE_BASE_PIXELS {
            return IMAGE_BASE_TOKENS;
        }
        let tiles = pixels.div_ceil(IMAGE_TILE_PIXELS);
        tiles * IMAGE_BASE_TOKENS
    }

    /// Records the cost of one captured image.
    pub fn add_image_tokens(&mut self, width: u32, height: u32) {
        self.add_tokens(Self::calculate_image_tokens(width, height), TokenKind::Image);
    }

    /// Accrues audio cost for the wall time elapsed since the last call.
    ///
    /// The first call only anchors the measurement start and records
    /// nothing. Subsequent calls add `16 tokens/sec x elapsed` (floored)
    /// and re-anchor.
    pub fn track_audio_tokens(&mut self) {
        self.track_audio_tokens_at(Instant::now());
    }

    /// Time-injected variant of [`track_audio_tokens`](Self::track_audio_tokens).
    pub fn track_audio_tokens_at(&mut self, now: Instant) {
        let Some(anchor) = self.audio_anchor else {
            self.audio_anchor = Some(now);
            return;
        };

        let elapsed = now.saturating_duration_since(anchor);
        let tokens = (elapsed.as_secs_f64() * AUDIO_TOKENS_PER_SECOND).floor() as u64;
        if tokens > 0 {
            self.add_tokens_at(tokens, TokenKind::Audio, now);
            self.audio_anchor = Some(now);
        }
    }

    /// Total tokens recorded within the last minute.
    pub fn tokens_in_window(&mut self) -> u64 {
        self.tokens_in_window_at(Instant::now())
    }

    /// Time-injected variant of [`tokens_in_window`](Self::tokens_in_window).
    pub fn tokens_in_window_at(&mut self, now: Instant) -> u64 {
        self.prune(now);
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Advisory throttle check.
    ///
    /// Returns `true` when the current window total has reached
    /// `percent_threshold` percent of `budget` tokens per minute. Never
    /// enforces anything - callers decide whether to act on the signal.
    pub fn should_throttle(&mut self, budget: u64, percent_threshold: u8) -> bool {
        self.should_throttle_at(budget, percent_threshold, Instant::now())
    }

    /// Time-injected variant of [`should_throttle`](Self::should_throttle).
    pub fn should_throttle_at(&mut self, budget: u64, percent_threshold: u8, now: Instant) -> bool {
        let current = self.tokens_in_window_at(now);
        let threshold = budget.saturating_mul(u64::from(percent_threshold)) / 100;
        tracing::debug!(current, budget, threshold, "token budget check");
        current >= threshold
    }

    /// Clears history and re-anchors the measurement start.
    ///
    /// Called once per new capture session.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.audio_anchor = None;
    }

    fn prune(&mut self, now: Instant) {
        self.entries
            .retain(|e| now.saturating_duration_since(e.timestamp) <= WINDOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_tokens_two_seconds() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();

        // First call anchors only
        tracker.track_audio_tokens_at(t0);
        assert_eq!(tracker.tokens_in_window_at(t0), 0);

        // Two seconds later: 16 tokens/sec * 2s = 32
        let t1 = t0 + Duration::from_secs(2);
        tracker.track_audio_tokens_at(t1);
        assert_eq!(tracker.tokens_in_window_at(t1), 32);
    }

    #[test]
    fn test_audio_tokens_reanchor() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();
        tracker.track_audio_tokens_at(t0);
        tracker.track_audio_tokens_at(t0 + Duration::from_secs(2));
        tracker.track_audio_tokens_at(t0 + Duration::from_secs(4));
        // Two 2-second accruals, not one 4-second double count
        assert_eq!(tracker.tokens_in_window_at(t0 + Duration::from_secs(4)), 64);
    }

    #[test]
    fn test_subsecond_elapsed_keeps_anchor() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();
        tracker.track_audio_tokens_at(t0);
        // 16 tokens/sec * 30ms rounds down to 0; anchor must not move
        tracker.track_audio_tokens_at(t0 + Duration::from_millis(30));
        tracker.track_audio_tokens_at(t0 + Duration::from_secs(1));
        assert_eq!(tracker.tokens_in_window_at(t0 + Duration::from_secs(1)), 16);
    }

    #[test]
    fn test_image_tokens_small() {
        assert_eq!(TokenBudgetTracker::calculate_image_tokens(384, 384), 85);
        assert_eq!(TokenBudgetTracker::calculate_image_tokens(100, 100), 85);
    }

    #[test]
    fn test_image_tokens_tiled() {
        // 1920*1080 = 2,073,600 pixels; 768^2 = 589,824; ceil = 4 tiles
        assert_eq!(
            TokenBudgetTracker::calculate_image_tokens(1920, 1080),
            4 * 85
        );
    }

    #[test]
    fn test_window_pruning() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();
        tracker.add_tokens_at(100, TokenKind::Audio, t0);
        assert_eq!(tracker.tokens_in_window_at(t0), 100);

        // 61 seconds later the entry has aged out
        let t1 = t0 + Duration::from_secs(61);
        assert_eq!(tracker.tokens_in_window_at(t1), 0);
    }

    #[test]
    fn test_should_throttle_threshold() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();
        tracker.add_tokens_at(750, TokenKind::Audio, t0);

        // 75% of 1000 = 750; at exactly the threshold, throttle
        assert!(tracker.should_throttle_at(1000, 75, t0));
        assert!(!tracker.should_throttle_at(10_000, 75, t0));
    }

    #[test]
    fn test_reset() {
        let mut tracker = TokenBudgetTracker::new();
        let t0 = Instant::now();
        tracker.track_audio_tokens_at(t0);
        tracker.add_tokens_at(500, TokenKind::Image, t0);

        tracker.reset();
        assert_eq!(tracker.tokens_in_window_at(t0), 0);

        // Anchor is gone: next audio call anchors again instead of accruing
        let t1 = t0 + Duration::from_secs(10);
        tracker.track_audio_tokens_at(t1);
        assert_eq!(tracker.tokens_in_window_at(t1), 0);
    }
}
