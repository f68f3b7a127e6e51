//! The fixed segment table of the reel and the segment resolver.

/// Length of the composition in seconds.
pub const DURATION: f64 = 60.0;

/// A half-open interval `[start, end)` of the composition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub id: &'static str,
    /// Seconds, inclusive.
    pub start: f64,
    /// Seconds, exclusive.
    pub end: f64,
    pub label: &'static str,
    pub caption: &'static str,
}

impl Segment {
    /// Whether `t` falls inside this segment.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Length of the segment in seconds.
    pub fn len_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Contiguous, ordered segments covering `[0, DURATION)`.
pub const SEGMENTS: [Segment; 4] = [
    Segment {
        id: "intro",
        start: 0.0,
        end: 8.0,
        label: "Intro",
        caption: "In the lanes of Allahabad, where love met sacrifice, lived a man \u{2014} Chander.",
    },
    Segment {
        id: "love",
        start: 8.0,
        end: 19.0,
        label: "Love Blooms",
        caption: "Chander\u{2026} tum itne chup kyu rehte ho?",
    },
    Segment {
        id: "conflict",
        start: 19.0,
        end: 32.0,
        label: "Conflict",
        caption: "He loved her \u{2014} deeply, silently, purely\u{2026}",
    },
    Segment {
        id: "outro",
        start: 32.0,
        end: DURATION,
        label: "Epilogue",
        caption: "Some letters are never sent. Some loves never fade.",
    },
];

/// Resolve the active segment for `elapsed` seconds.
///
/// Anything at or past the end of the composition resolves to the final
/// segment. Negative or NaN input is treated as the start of the reel.
pub fn segment_at(elapsed: f64) -> &'static Segment {
    let t = if elapsed.is_nan() { 0.0 } else { elapsed.max(0.0) };
    let segments: &'static [Segment] = &SEGMENTS;
    segments
        .iter()
        .find(|s| s.contains(t))
        .unwrap_or(&segments[segments.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_contiguous_and_exhaustive() {
        assert_eq!(SEGMENTS[0].start, 0.0);
        for pair in SEGMENTS.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "{} -> {}", pair[0].id, pair[1].id);
            assert!(pair[0].len_secs() > 0.0);
        }
        assert_eq!(SEGMENTS[SEGMENTS.len() - 1].end, DURATION);
    }

    #[test]
    fn every_time_resolves_to_exactly_one_segment() {
        // 10 ms steps across the whole reel
        for step in 0..6000 {
            let t = step as f64 * 0.01;
            let matching = SEGMENTS.iter().filter(|s| s.contains(t)).count();
            assert_eq!(matching, 1, "t = {t}");
            assert!(segment_at(t).contains(t), "t = {t}");
        }
    }

    #[test]
    fn scenario_times() {
        assert_eq!(segment_at(8.5).id, "love");
        assert_eq!(segment_at(19.5).id, "conflict");
        assert_eq!(segment_at(60.5).id, "outro");
    }

    #[test]
    fn boundaries_belong_to_the_later_segment() {
        assert_eq!(segment_at(7.999).id, "intro");
        assert_eq!(segment_at(8.0).id, "love");
        assert_eq!(segment_at(19.0).id, "conflict");
        assert_eq!(segment_at(32.0).id, "outro");
    }

    #[test]
    fn past_the_end_defaults_to_last() {
        assert_eq!(segment_at(DURATION).id, "outro");
        assert_eq!(segment_at(1e9).id, "outro");
        assert_eq!(segment_at(f64::INFINITY).id, "outro");
    }

    #[test]
    fn before_the_start_is_intro() {
        assert_eq!(segment_at(-1.0).id, "intro");
        assert_eq!(segment_at(f64::NAN).id, "intro");
    }
}
