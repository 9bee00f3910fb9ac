//! Snapping of requested output sizes onto the sizes the SDXL model accepts.

use std::fmt;

/// A pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sizes accepted by `stable-diffusion-xl-1024-v1-0`.
pub const ALLOWED_SDXL_DIMS: &[Dimensions] = &[
    Dimensions::new(1024, 1024),
    Dimensions::new(1152, 896),
    Dimensions::new(1216, 832),
    Dimensions::new(1344, 768),
    Dimensions::new(1536, 640),
    Dimensions::new(896, 1152),
    Dimensions::new(832, 1216),
    Dimensions::new(768, 1344),
    Dimensions::new(640, 1536),
];

pub fn is_allowed(requested: Dimensions) -> bool {
    ALLOWED_SDXL_DIMS.contains(&requested)
}

/// Picks the candidate whose aspect ratio is closest to `requested`, breaking
/// ties by closeness of pixel area. Equal scores keep the earlier candidate.
///
/// # Panics
///
/// Panics if `candidates` is empty.
pub fn snap_to(requested: Dimensions, candidates: &[Dimensions]) -> Dimensions {
    assert!(!candidates.is_empty(), "snap_to requires at least one candidate size");

    let target_ar = requested.aspect_ratio();
    let target_area = requested.area();
    let score = |c: &Dimensions| (
        (c.aspect_ratio() - target_ar).abs(),
        c.area().abs_diff(target_area),
    );

    let mut best = candidates[0];
    let mut best_score = score(&best);
    for candidate in &candidates[1..] {
        let s = score(candidate);
        if s.0 < best_score.0 || (s.0 == best_score.0 && s.1 < best_score.1) {
            best = *candidate;
            best_score = s;
        }
    }
    best
}

/// Returns `requested` untouched when SDXL accepts it, otherwise the nearest
/// allowed size.
pub fn snap_sdxl(requested: Dimensions) -> Dimensions {
    if is_allowed(requested) {
        requested
    } else {
        snap_to(requested, ALLOWED_SDXL_DIMS)
    }
}

/// Maps a size onto a preset aspect-ratio label, or `WxH` when none is close.
pub fn aspect_ratio_label(dims: Dimensions) -> String {
    if dims.width == dims.height {
        return "1:1".to_string();
    }
    let ar = dims.aspect_ratio();
    const PRESETS: &[(&str, f64)] = &[
        ("16:9", 16.0 / 9.0),
        ("9:16", 9.0 / 16.0),
        ("4:3", 4.0 / 3.0),
        ("3:4", 3.0 / 4.0),
    ];
    PRESETS
        .iter()
        .find(|(_, ratio)| (ar - ratio).abs() < 0.02)
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| dims.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_sizes_are_returned_unchanged() {
        for dims in ALLOWED_SDXL_DIMS {
            assert_eq!(snap_sdxl(*dims), *dims);
        }
    }

    #[test]
    fn hd_request_snaps_to_widescreen() {
        let candidates = [Dimensions::new(1024, 1024), Dimensions::new(1344, 768)];
        assert_eq!(
            snap_to(Dimensions::new(1280, 720), &candidates),
            Dimensions::new(1344, 768)
        );
        assert_eq!(snap_sdxl(Dimensions::new(1280, 720)), Dimensions::new(1344, 768));
    }

    #[test]
    fn portrait_request_snaps_to_portrait() {
        assert_eq!(snap_sdxl(Dimensions::new(720, 1280)), Dimensions::new(768, 1344));
        assert_eq!(snap_sdxl(Dimensions::new(512, 512)), Dimensions::new(1024, 1024));
    }

    #[test]
    fn snapped_aspect_is_never_beaten_by_another_candidate() {
        let requests = [(300, 200), (1920, 1080), (100, 900), (999, 1001), (4000, 1000)];
        for (w, h) in requests {
            let requested = Dimensions::new(w, h);
            let chosen = snap_sdxl(requested);
            let chosen_diff = (chosen.aspect_ratio() - requested.aspect_ratio()).abs();
            for other in ALLOWED_SDXL_DIMS {
                let diff = (other.aspect_ratio() - requested.aspect_ratio()).abs();
                assert!(chosen_diff <= diff, "{requested} -> {chosen} but {other} is closer");
            }
        }
    }

    #[test]
    fn equal_aspect_ties_break_on_area() {
        let candidates = [Dimensions::new(2000, 1000), Dimensions::new(600, 300)];
        assert_eq!(
            snap_to(Dimensions::new(700, 350), &candidates),
            Dimensions::new(600, 300)
        );
    }

    #[test]
    #[should_panic]
    fn empty_candidate_list_panics() {
        snap_to(Dimensions::new(10, 10), &[]);
    }

    #[test]
    fn aspect_labels() {
        assert_eq!(aspect_ratio_label(Dimensions::new(1024, 1024)), "1:1");
        assert_eq!(aspect_ratio_label(Dimensions::new(1280, 720)), "16:9");
        assert_eq!(aspect_ratio_label(Dimensions::new(720, 1280)), "9:16");
        assert_eq!(aspect_ratio_label(Dimensions::new(1024, 768)), "4:3");
        assert_eq!(aspect_ratio_label(Dimensions::new(1344, 768)), "1344x768");
    }
}
