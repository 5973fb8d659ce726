//! Loudspeaker layouts.

use crate::SceneError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tascar_core::{db2lin, DVec3, PosExt, DEG2RAD};

/// One loudspeaker, placed in spherical coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerDesc {
    /// Azimuth in degrees.
    pub az: f64,
    /// Elevation in degrees.
    pub el: f64,
    /// Distance in metres.
    pub r: f64,
    /// Gain in dB.
    pub gain: f64,
    /// Extra delay in seconds.
    pub delay: f64,
    /// Channel label.
    pub label: String,
    /// Output port this channel is meant to be connected to.
    pub connect: String,
}

impl Default for SpeakerDesc {
    fn default() -> Self {
        Self {
            az: 0.0,
            el: 0.0,
            r: 1.0,
            gain: 0.0,
            delay: 0.0,
            label: String::new(),
            connect: String::new(),
        }
    }
}

impl SpeakerDesc {
    /// Speaker at azimuth `az` degrees in the horizontal plane.
    pub fn at_azimuth(az: f64) -> Self {
        Self {
            az,
            ..Self::default()
        }
    }

    /// Cartesian position relative to the receiver.
    pub fn position(&self) -> DVec3 {
        DVec3::from_sphere(self.r, self.az * DEG2RAD, self.el * DEG2RAD)
    }

    /// Linear gain.
    pub fn linear_gain(&self) -> f64 {
        db2lin(self.gain)
    }
}

/// A loudspeaker layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerLayout {
    /// Layout name.
    pub name: String,
    /// Gain of the first-order components of the diffuse decoder.
    pub xyzgain: f64,
    /// Apply speaker density weights to diffuse rendering.
    pub densitycorr: bool,
    /// Loudspeakers in channel order.
    pub speaker: Vec<SpeakerDesc>,
}

impl Default for SpeakerLayout {
    fn default() -> Self {
        Self {
            name: String::new(),
            xyzgain: 1.0,
            densitycorr: true,
            speaker: Vec::new(),
        }
    }
}

impl SpeakerLayout {
    /// Regular horizontal ring of `n` speakers, the first one in front.
    pub fn circle(n: usize, r: f64) -> Self {
        Self {
            name: format!("circle{n}"),
            speaker: (0..n)
                .map(|k| SpeakerDesc {
                    r,
                    ..SpeakerDesc::at_azimuth(360.0 * k as f64 / n as f64)
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Parse a layout from a TOML string and validate it.
    pub fn parse_str(input: &str) -> Result<Self, SceneError> {
        let layout: SpeakerLayout = toml::from_str(input)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout file from disk.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        Self::parse_str(&data)
    }

    /// Check that the layout is usable.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.speaker.is_empty() {
            return Err(SceneError::Invalid(format!(
                "layout '{}' has no speakers",
                self.name
            )));
        }
        for (k, spk) in self.speaker.iter().enumerate() {
            if !(spk.r > 0.0) {
                return Err(SceneError::Invalid(format!(
                    "speaker {k} of layout '{}' has non-positive distance {}",
                    self.name, spk.r
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_with_defaults() {
        let toml = r#"
            name = "quad"
            [[speaker]]
            az = 45
            [[speaker]]
            az = 135
            r = 2.0
            gain = -6
        "#;
        let layout = SpeakerLayout::parse_str(toml).expect("valid layout");
        assert_eq!(layout.speaker.len(), 2);
        assert_eq!(layout.speaker[0].r, 1.0);
        assert_eq!(layout.xyzgain, 1.0);
        assert!((layout.speaker[1].linear_gain() - 0.501187).abs() < 1e-5);
    }

    #[test]
    fn empty_layout_is_invalid() {
        let err = SpeakerLayout::parse_str("name = \"none\"").unwrap_err();
        assert!(matches!(err, SceneError::Invalid(_)));
    }

    #[test]
    fn circle_places_first_speaker_in_front() {
        let layout = SpeakerLayout::circle(4, 2.0);
        assert!((layout.speaker[0].position() - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-12);
        assert!((layout.speaker[1].position() - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-9);
    }
}
