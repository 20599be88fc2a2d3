use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default volume for new tracks and for the project master.
pub const DEFAULT_VOLUME: f64 = 75.0;

/// Range shared by track volume, master volume and most effect parameters.
pub const LEVEL_RANGE: (f64, f64) = (0.0, 100.0);

/// Shared, immutable decoded audio.
///
/// `AudioArc` keeps the interleaved samples in an `Arc<[f32]>` so clips,
/// history entries and snapshots can all hold the same buffer without copying
/// it. Cloning only bumps the reference count.
///
/// Two `AudioArc`s compare equal when they share the same allocation: buffer
/// identity is what matters to the project model, not the sample values.
///
/// # Examples
///
/// ```
/// use saund_transport::AudioArc;
///
/// let audio = AudioArc::new(vec![0.0, 0.5, 1.0, 0.5], 44100, 2);
/// let shared = audio.clone();
/// assert_eq!(audio, shared);
/// assert_eq!(audio.frames(), 2);
/// ```
#[derive(Clone)]
pub struct AudioArc {
    /// Interleaved samples, e.g. [L, R, L, R, ...] for stereo.
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioArc {
    /// Create a new `AudioArc` from owned interleaved samples.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is 0 or if `samples.len()` is not divisible by `channels`.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self::from_arc(Arc::from(samples), sample_rate, channels)
    }

    /// Create an `AudioArc` around an existing shared slice.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is 0 or if `samples.len()` is not divisible by `channels`.
    pub fn from_arc(samples: Arc<[f32]>, sample_rate: u32, channels: u16) -> Self {
        assert!(channels > 0, "channels must be greater than 0");
        assert_eq!(
            samples.len() % channels as usize,
            0,
            "samples.len() must be divisible by channels"
        );
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Fallible constructor for data that comes from outside the process.
    pub fn try_new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Option<Self> {
        if channels == 0 || sample_rate == 0 || samples.len() % channels as usize != 0 {
            return None;
        }
        Some(Self::new(samples, sample_rate, channels))
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_arc(&self) -> &Arc<[f32]> {
        &self.samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds. Zero for a buffer with no sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

impl PartialEq for AudioArc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
            && self.sample_rate == other.sample_rate
            && self.channels == other.channels
    }
}

impl fmt::Debug for AudioArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioArc")
            .field("frames", &self.frames())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("duration_secs", &self.duration_secs())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the seven per-track effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectField {
    PreGain,
    Clarity,
    Pan,
    Reverb,
    Delay,
    Compression,
    Eq,
}

impl EffectField {
    pub const ALL: [EffectField; 7] = [
        EffectField::PreGain,
        EffectField::Clarity,
        EffectField::Pan,
        EffectField::Reverb,
        EffectField::Delay,
        EffectField::Compression,
        EffectField::Eq,
    ];

    /// Wire name, as used in snapshots and by callers addressing a field by string.
    pub fn name(self) -> &'static str {
        match self {
            EffectField::PreGain => "preGain",
            EffectField::Clarity => "clarity",
            EffectField::Pan => "pan",
            EffectField::Reverb => "reverb",
            EffectField::Delay => "delay",
            EffectField::Compression => "compression",
            EffectField::Eq => "eq",
        }
    }

    pub fn range(self) -> (f64, f64) {
        match self {
            EffectField::Pan => (-50.0, 50.0),
            _ => LEVEL_RANGE,
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        clamp_to_range(value, self.range())
    }
}

impl fmt::Display for EffectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown track parameter '{0}'")]
pub struct ParseParamError(pub String);

impl FromStr for EffectField {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| ParseParamError(s.to_string()))
    }
}

/// A track-level value addressable by `update_track_effect`: the track volume
/// or one of its effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackParam {
    Volume,
    Effect(EffectField),
}

impl TrackParam {
    pub fn name(self) -> &'static str {
        match self {
            TrackParam::Volume => "volume",
            TrackParam::Effect(field) => field.name(),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        match self {
            TrackParam::Volume => clamp_to_range(value, LEVEL_RANGE),
            TrackParam::Effect(field) => field.clamp(value),
        }
    }
}

impl fmt::Display for TrackParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackParam {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "volume" {
            return Ok(TrackParam::Volume);
        }
        s.parse().map(TrackParam::Effect)
    }
}

/// Clamp into `[min, max]`. NaN maps to `min`.
pub fn clamp_to_range(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub pre_gain: f64,
    pub clarity: f64,
    pub pan: f64,
    pub reverb: f64,
    pub delay: f64,
    pub compression: f64,
    pub eq: f64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pre_gain: 50.0,
            clarity: 50.0,
            pan: 0.0,
            reverb: 0.0,
            delay: 0.0,
            compression: 0.0,
            eq: 50.0,
        }
    }
}

impl EffectSettings {
    pub fn get(&self, field: EffectField) -> f64 {
        match field {
            EffectField::PreGain => self.pre_gain,
            EffectField::Clarity => self.clarity,
            EffectField::Pan => self.pan,
            EffectField::Reverb => self.reverb,
            EffectField::Delay => self.delay,
            EffectField::Compression => self.compression,
            EffectField::Eq => self.eq,
        }
    }

    pub fn set(&mut self, field: EffectField, value: f64) {
        let slot = match field {
            EffectField::PreGain => &mut self.pre_gain,
            EffectField::Clarity => &mut self.clarity,
            EffectField::Pan => &mut self.pan,
            EffectField::Reverb => &mut self.reverb,
            EffectField::Delay => &mut self.delay,
            EffectField::Compression => &mut self.compression,
            EffectField::Eq => &mut self.eq,
        };
        *slot = value;
    }

    /// Every field pulled into its range.
    pub fn clamped(mut self) -> Self {
        for field in EffectField::ALL {
            self.set(field, field.clamp(self.get(field)));
        }
        self
    }
}

/// A placed audio segment covering `[start, end)` seconds on its track.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub start: f64,
    pub end: f64,
    pub audio: AudioArc,
}

impl Clip {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Shift the clip so it begins at `start`, keeping its length.
    pub fn move_to(&mut self, start: f64) {
        let duration = self.duration();
        self.start = start;
        self.end = start + duration;
    }
}

/// Presentation color for a track lane. Carries no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Pink,
}

impl TrackColor {
    pub const PALETTE: [TrackColor; 6] = [
        TrackColor::Red,
        TrackColor::Blue,
        TrackColor::Green,
        TrackColor::Yellow,
        TrackColor::Purple,
        TrackColor::Pink,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackColor::Red => "red",
            TrackColor::Blue => "blue",
            TrackColor::Green => "green",
            TrackColor::Yellow => "yellow",
            TrackColor::Purple => "purple",
            TrackColor::Pink => "pink",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::PALETTE.into_iter().find(|color| color.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Type tag from the project type's vocabulary, e.g. "Keys" or "Host".
    pub kind: String,
    pub color: TrackColor,
    pub volume: f64,
    pub effects: EffectSettings,
    /// Insertion order. Clips may overlap.
    clips: Vec<Clip>,
}

impl Track {
    pub fn new(id: TrackId, name: String, kind: String, color: TrackColor) -> Self {
        Self {
            id,
            name,
            kind,
            color,
            volume: DEFAULT_VOLUME,
            effects: EffectSettings::default(),
            clips: Vec::new(),
        }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id == id)
    }

    pub fn push_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Remove a clip by id, returning it if it was present.
    pub fn remove_clip(&mut self, id: ClipId) -> Option<Clip> {
        let index = self.clips.iter().position(|clip| clip.id == id)?;
        Some(self.clips.remove(index))
    }

    /// Latest clip end on this track, 0 when it has no clips.
    pub fn end(&self) -> f64 {
        self.clips.iter().map(|clip| clip.end).fold(0.0, f64::max)
    }

    pub fn param(&self, param: TrackParam) -> f64 {
        match param {
            TrackParam::Volume => self.volume,
            TrackParam::Effect(field) => self.effects.get(field),
        }
    }

    pub fn set_param(&mut self, param: TrackParam, value: f64) {
        match param {
            TrackParam::Volume => self.volume = value,
            TrackParam::Effect(field) => self.effects.set(field, value),
        }
    }
}

/// Kind of project, deciding which track types are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectType {
    Music,
    #[default]
    Podcast,
}

impl ProjectType {
    pub fn track_types(self) -> &'static [&'static str] {
        match self {
            ProjectType::Music => &[
                "Voice & Mic",
                "Keys",
                "Bass & 808",
                "Guitar",
                "Drums & Machines",
                "Synth",
            ],
            ProjectType::Podcast => &["Host", "Guest", "Sound FX", "Music Bed"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProjectType::Music => "music",
            ProjectType::Podcast => "podcast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "music" => Some(ProjectType::Music),
            "podcast" => Some(ProjectType::Podcast),
            _ => None,
        }
    }
}
