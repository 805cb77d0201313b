//! Release quality model.
//!
//! A release's quality is detected as a (resolution, source, codec) triple
//! and always resolves to one [`Quality`] value. `Quality::Unknown` is a
//! valid tag, never a missing one.

use serde::{Deserialize, Serialize};

/// Vertical resolution class of a release.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Unknown,
    Sd,
    Hd720,
    Hd1080,
    Uhd2160,
}

/// Capture source of a release.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    Unknown,
    Tv,
    Dvd,
    Web,
    BluRay,
}

/// Video codec of a release.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    #[default]
    Unknown,
    Xvid,
    Avc,
    Hevc,
}

/// The fixed set of qualities every release resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Unknown,
    SdTv,
    SdDvd,
    HdTv,
    HdWebDl,
    HdBluRay,
    FullHdTv,
    FullHdWebDl,
    FullHdBluRay,
    UhdTv,
    UhdWebDl,
    UhdBluRay,
}

impl Quality {
    /// Every quality, lowest first. This is also the default ranking order.
    pub const ALL: [Quality; 12] = [
        Quality::Unknown,
        Quality::SdTv,
        Quality::SdDvd,
        Quality::HdTv,
        Quality::HdWebDl,
        Quality::HdBluRay,
        Quality::FullHdTv,
        Quality::FullHdWebDl,
        Quality::FullHdBluRay,
        Quality::UhdTv,
        Quality::UhdWebDl,
        Quality::UhdBluRay,
    ];
}

/// Detected (resolution, source, codec) triple of a release.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct QualityTag {
    pub resolution: Resolution,
    pub source: Source,
    pub codec: Codec,
}

impl QualityTag {
    pub fn new(resolution: Resolution, source: Source, codec: Codec) -> Self {
        Self {
            resolution,
            source,
            codec,
        }
    }

    /// Detect the quality triple from a raw release title.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let has = |needle: &str| tokens.iter().any(|t| *t == needle);

        let resolution = if has("2160p") || has("4k") || has("uhd") {
            Resolution::Uhd2160
        } else if has("1080p") || has("1080i") {
            Resolution::Hd1080
        } else if has("720p") {
            Resolution::Hd720
        } else if has("480p") || has("576p") || has("sdtv") {
            Resolution::Sd
        } else {
            Resolution::Unknown
        };

        let source = if has("bluray") || lower.contains("blu-ray") || has("bdrip") || has("brrip") {
            Source::BluRay
        } else if has("web") || has("webdl") || has("webrip") || has("amzn") {
            Source::Web
        } else if has("dvdrip") || has("dvd") {
            Source::Dvd
        } else if has("hdtv") || has("pdtv") || has("sdtv") || has("dsr") {
            Source::Tv
        } else {
            Source::Unknown
        };

        let codec = if has("x265") || has("h265") || has("hevc") || lower.contains("h.265") {
            Codec::Hevc
        } else if has("x264") || has("h264") || has("avc") || lower.contains("h.264") {
            Codec::Avc
        } else if has("xvid") || has("divx") {
            Codec::Xvid
        } else {
            Codec::Unknown
        };

        Self::new(resolution, source, codec)
    }

    /// Resolve the triple to the fixed quality set.
    pub fn quality(&self) -> Quality {
        match (self.resolution, self.source) {
            (Resolution::Uhd2160, Source::BluRay) => Quality::UhdBluRay,
            (Resolution::Uhd2160, Source::Web) => Quality::UhdWebDl,
            (Resolution::Uhd2160, _) => Quality::UhdTv,
            (Resolution::Hd1080, Source::BluRay) => Quality::FullHdBluRay,
            (Resolution::Hd1080, Source::Web) => Quality::FullHdWebDl,
            (Resolution::Hd1080, _) => Quality::FullHdTv,
            (Resolution::Hd720, Source::BluRay) => Quality::HdBluRay,
            (Resolution::Hd720, Source::Web) => Quality::HdWebDl,
            (Resolution::Hd720, _) => Quality::HdTv,
            (Resolution::Sd | Resolution::Unknown, Source::Dvd) => Quality::SdDvd,
            (Resolution::Sd | Resolution::Unknown, Source::Tv) => Quality::SdTv,
            (Resolution::Sd, _) => Quality::SdTv,
            (Resolution::Unknown, _) => Quality::Unknown,
        }
    }
}

/// Total order over qualities, supplied as configuration.
///
/// Qualities listed later rank higher. A quality missing from the list ranks
/// as 0, below everything listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct QualityOrder(Vec<Quality>);

impl Default for QualityOrder {
    fn default() -> Self {
        Self(Quality::ALL.to_vec())
    }
}

impl QualityOrder {
    pub fn new(order: Vec<Quality>) -> Self {
        Self(order)
    }

    /// 1-based ordinal of a quality in this order (0 when absent).
    pub fn ordinal(&self, quality: Quality) -> u32 {
        self.0
            .iter()
            .position(|q| *q == quality)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    pub fn max_ordinal(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_full_hd_web_dl() {
        let tag = QualityTag::from_title("Show.Name.S01E02.1080p.WEB-DL.DD5.1.H.264-GRP");
        assert_eq!(tag.resolution, Resolution::Hd1080);
        assert_eq!(tag.source, Source::Web);
        assert_eq!(tag.codec, Codec::Avc);
        assert_eq!(tag.quality(), Quality::FullHdWebDl);
    }

    #[test]
    fn test_detects_hdtv_720p() {
        let tag = QualityTag::from_title("Show Name S03E10 720p HDTV x264-KILLERS");
        assert_eq!(tag.quality(), Quality::HdTv);
        assert_eq!(tag.codec, Codec::Avc);
    }

    #[test]
    fn test_detects_uhd_bluray_hevc() {
        let tag = QualityTag::from_title("Show.S02E01.2160p.BluRay.x265-GRP");
        assert_eq!(tag.quality(), Quality::UhdBluRay);
        assert_eq!(tag.codec, Codec::Hevc);
    }

    #[test]
    fn test_sd_sources() {
        assert_eq!(
            QualityTag::from_title("Show.S01E01.DVDRip.XviD-GRP").quality(),
            Quality::SdDvd
        );
        assert_eq!(
            QualityTag::from_title("Show.S01E01.HDTV.XviD-GRP").quality(),
            Quality::SdTv
        );
    }

    #[test]
    fn test_unknown_is_a_valid_tag() {
        let tag = QualityTag::from_title("Some Random Upload");
        assert_eq!(tag, QualityTag::default());
        assert_eq!(tag.quality(), Quality::Unknown);
    }

    #[test]
    fn test_default_order_ranks_higher_resolutions_higher() {
        let order = QualityOrder::default();
        assert!(order.ordinal(Quality::FullHdWebDl) > order.ordinal(Quality::HdTv));
        assert!(order.ordinal(Quality::UhdBluRay) > order.ordinal(Quality::FullHdBluRay));
        assert_eq!(order.ordinal(Quality::Unknown), 1);
        assert_eq!(order.max_ordinal(), 12);
    }

    #[test]
    fn test_custom_order_missing_quality_ranks_zero() {
        let order = QualityOrder::new(vec![Quality::HdTv, Quality::FullHdWebDl]);
        assert_eq!(order.ordinal(Quality::UhdBluRay), 0);
        assert_eq!(order.ordinal(Quality::FullHdWebDl), 2);
    }

    #[test]
    fn test_quality_serialization() {
        assert_eq!(
            serde_json::to_string(&Quality::FullHdWebDl).unwrap(),
            "\"full_hd_web_dl\""
        );
        let order: QualityOrder = serde_json::from_str(r#"["sd_tv", "hd_tv"]"#).unwrap();
        assert_eq!(order.ordinal(Quality::HdTv), 2);
    }
}
