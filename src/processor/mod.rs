mod resizer;

use serde::Serialize;

pub use resizer::process_renditions;

/// One of the fixed derived image sizes produced from every upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendition {
    Thumb,
    Medium,
    Large,
}

impl Rendition {
    pub const ALL: [Rendition; 3] = [Rendition::Thumb, Rendition::Medium, Rendition::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// The static sizing and quality targets for this rendition.
    pub fn spec(&self) -> RenditionSpec {
        match self {
            Self::Thumb => RenditionSpec {
                width: 300,
                height: 200,
                fit: FitMode::Cover,
                quality: 80,
            },
            Self::Medium => RenditionSpec {
                width: 800,
                height: 600,
                fit: FitMode::Cover,
                quality: 85,
            },
            Self::Large => RenditionSpec {
                width: 1920,
                height: 1080,
                fit: FitMode::Inside,
                quality: 90,
            },
        }
    }
}

/// The sizing and quality targets of a single rendition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,

    /// The JPEG encode quality, `0..=100`.
    pub quality: u8,
}

/// How a source image is mapped onto the target box.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FitMode {
    /// Scale and crop to exactly fill the target box, discarding overflow
    /// equally from the dimension with excess.
    Cover,

    /// Scale down to fit within the box preserving aspect ratio, passing
    /// the image through unscaled if it already fits.
    Inside,
}

/// A fixed-size mapping holding one value per rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renditions<T> {
    pub thumb: T,
    pub medium: T,
    pub large: T,
}

impl<T> Renditions<T> {
    /// Builds the mapping by invoking `f` once per rendition.
    pub fn from_fn(mut f: impl FnMut(Rendition) -> T) -> Self {
        Self {
            thumb: f(Rendition::Thumb),
            medium: f(Rendition::Medium),
            large: f(Rendition::Large),
        }
    }

    pub fn get(&self, rendition: Rendition) -> &T {
        match rendition {
            Rendition::Thumb => &self.thumb,
            Rendition::Medium => &self.medium,
            Rendition::Large => &self.large,
        }
    }

    pub fn set(&mut self, rendition: Rendition, value: T) {
        match rendition {
            Rendition::Thumb => self.thumb = value,
            Rendition::Medium => self.medium = value,
            Rendition::Large => self.large = value,
        }
    }

    /// All three values alongside their rendition, in declaration order.
    pub fn entries(&self) -> [(Rendition, &T); 3] {
        [
            (Rendition::Thumb, &self.thumb),
            (Rendition::Medium, &self.medium),
            (Rendition::Large, &self.large),
        ]
    }
}

impl<T: Clone> Renditions<T> {
    pub fn to_vec(&self) -> Vec<T> {
        vec![self.thumb.clone(), self.medium.clone(), self.large.clone()]
    }
}
