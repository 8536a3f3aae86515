use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

/// A 256 step color lookup.
pub trait Palette {
    fn color_at(&self, index: u8) -> Rgb888;
}

/// `c * (256 - amount) / 256` on every channel.
pub fn fade_to_black(color: Rgb888, amount: u8) -> Rgb888 {
    let keep = 256 - amount as u16;
    let scale = |c: u8| ((c as u16 * keep) >> 8) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

/// Blends from `a` towards `b` by `amount / 256`.
pub fn blend(a: Rgb888, b: Rgb888, amount: u8) -> Rgb888 {
    let mix = |x: u8, y: u8| {
        let x = x as i32;
        let y = y as i32;
        (x + (y - x) * amount as i32 / 256) as u8
    };
    Rgb888::new(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

pub const fn rgb(hex: u32) -> Rgb888 {
    Rgb888::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Sixteen evenly spaced entries, blended linearly in between. Wraps from
/// the last entry back to the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPalette {
    entries: [Rgb888; 16],
}

impl IndexedPalette {
    pub const fn new(entries: [Rgb888; 16]) -> Self {
        Self { entries }
    }
}

impl Palette for IndexedPalette {
    fn color_at(&self, index: u8) -> Rgb888 {
        let slot = (index >> 4) as usize;
        let offset = index & 0x0F;
        let current = self.entries[slot];
        if offset == 0 {
            return current;
        }
        let next = self.entries[(slot + 1) % self.entries.len()];
        blend(current, next, offset << 4)
    }
}

/// Color stops at increasing positions, interpolated in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientPalette<const S: usize> {
    stops: [(u8, Rgb888); S],
}

impl<const S: usize> GradientPalette<S> {
    /// `stops` must be sorted by position.
    pub const fn new(stops: [(u8, Rgb888); S]) -> Self {
        Self { stops }
    }
}

impl<const S: usize> Palette for GradientPalette<S> {
    fn color_at(&self, index: u8) -> Rgb888 {
        let Some(&(first_pos, first)) = self.stops.first() else {
            return Rgb888::BLACK;
        };
        if index <= first_pos {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (lo_pos, lo) = pair[0];
            let (hi_pos, hi) = pair[1];
            if index == hi_pos {
                return hi;
            }
            if index < hi_pos {
                let span = (hi_pos - lo_pos) as u16;
                if span == 0 {
                    return hi;
                }
                let amount = ((index - lo_pos) as u16 * 256 / span).min(255) as u8;
                return blend(lo, hi, amount);
            }
        }
        self.stops.last().map_or(first, |&(_, color)| color)
    }
}

/// Dark green through green and yellow to red, for the VU meter.
pub const VU_GRADIENT: GradientPalette<5> = GradientPalette::new([
    (0, Rgb888::new(0, 4, 0)),
    (64, Rgb888::new(0, 255, 0)),
    (128, Rgb888::new(255, 255, 0)),
    (192, Rgb888::new(255, 0, 0)),
    (255, Rgb888::new(255, 0, 0)),
]);

/// One color per band on a 16 band display.
pub const BAND_COLORS: IndexedPalette = IndexedPalette::new([
    rgb(0xFD0E35),
    rgb(0xFF8833),
    rgb(0xFFEB00),
    rgb(0xAFE313),
    rgb(0x3AA655),
    rgb(0x8DD9CC),
    rgb(0x0066FF),
    rgb(0xDB91EF),
    rgb(0xFD0E35),
    rgb(0xFF8833),
    rgb(0xFFEB00),
    rgb(0xAFE313),
    rgb(0x3AA655),
    rgb(0x8DD9CC),
    rgb(0x0066FF),
    rgb(0xDB91EF),
]);

const RED: Rgb888 = rgb(0xFF0000);
const DARK_RED: Rgb888 = rgb(0x8B0000);
const MAROON: Rgb888 = rgb(0x800000);
const ORANGE: Rgb888 = rgb(0xFFA500);
const YELLOW: Rgb888 = rgb(0xFFFF00);
const WHITE: Rgb888 = rgb(0xFFFFFF);
const BLUE: Rgb888 = rgb(0x0000FF);
const DARK_BLUE: Rgb888 = rgb(0x00008B);
const SKY_BLUE: Rgb888 = rgb(0x87CEEB);
const LIGHT_BLUE: Rgb888 = rgb(0xADD8E6);

pub const BLUE_COLORS: IndexedPalette = IndexedPalette::new([
    BLUE, DARK_BLUE, DARK_BLUE, BLUE, BLUE, DARK_BLUE, DARK_BLUE, DARK_BLUE, BLUE, DARK_BLUE,
    SKY_BLUE, SKY_BLUE, LIGHT_BLUE, SKY_BLUE, LIGHT_BLUE, SKY_BLUE,
]);

pub const RED_COLORS: IndexedPalette = IndexedPalette::new([
    MAROON, MAROON, MAROON, MAROON, YELLOW, ORANGE, RED, DARK_RED, DARK_RED, DARK_RED, RED,
    ORANGE, YELLOW, ORANGE, RED, DARK_RED,
]);

pub const GREEN_COLORS: IndexedPalette = IndexedPalette::new([
    rgb(0x126412),
    rgb(0x32CD32),
    rgb(0x90EE90),
    rgb(0x006400),
    rgb(0x126412),
    rgb(0x32CD32),
    rgb(0x90EE90),
    rgb(0x006400),
    rgb(0x126412),
    rgb(0x32CD32),
    rgb(0x90EE90),
    rgb(0x006400),
    rgb(0x126412),
    rgb(0x32CD32),
    rgb(0x90EE90),
    rgb(0x006400),
]);

pub const PURPLE_COLORS: IndexedPalette = IndexedPalette::new([
    rgb(0x8F47B3),
    rgb(0xC9A0DC),
    rgb(0xBF8FCC),
    rgb(0x803790),
    rgb(0x733380),
    rgb(0xD6AEDD),
    rgb(0xC154C1),
    rgb(0xFC74FD),
    rgb(0x732E6C),
    rgb(0xE667CE),
    rgb(0xE29CD2),
    rgb(0x8E3179),
    rgb(0xD96CBE),
    rgb(0xEBB0D7),
    rgb(0xC8509B),
    rgb(0xBB3385),
]);

pub const YELLOW_COLORS: GradientPalette<4> = GradientPalette::new([
    (0, rgb(0xF80000)),
    (64, rgb(0xF8DC67)),
    (192, rgb(0xF8DC67)),
    (255, rgb(0xF80000)),
]);

/// Green, brown and earthy.
pub const COLORFUL: GradientPalette<11> = GradientPalette::new([
    (0, rgb(0x0A5505)),
    (25, rgb(0x1D6D12)),
    (60, rgb(0x3B8A2A)),
    (93, rgb(0x536334)),
    (106, rgb(0x6E4240)),
    (109, rgb(0x7B3141)),
    (113, rgb(0x8B2342)),
    (116, rgb(0xC07562)),
    (124, rgb(0xFFFF89)),
    (168, rgb(0x64B49B)),
    (255, rgb(0x1679AE)),
]);

/// Red and green watermelon.
pub const RAINBOW_SHERBET: GradientPalette<7> = GradientPalette::new([
    (0, rgb(0xFF2104)),
    (43, rgb(0xFF4419)),
    (86, rgb(0xFF0719)),
    (127, rgb(0xFF5267)),
    (170, rgb(0xFFFFF2)),
    (209, rgb(0x2AFF16)),
    (255, rgb(0x57FF41)),
]);

pub const CANADA_COLORS: IndexedPalette = IndexedPalette::new([
    RED, RED, RED, RED, WHITE, WHITE, WHITE, RED, RED, WHITE, WHITE, WHITE, RED, RED, RED, RED,
]);

pub const USA_COLORS: IndexedPalette = IndexedPalette::new([
    BLUE, BLUE, BLUE, BLUE, BLUE, RED, WHITE, RED, WHITE, RED, WHITE, RED, WHITE, RED, WHITE, RED,
]);

/// The selectable band color schemes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorScheme {
    #[default]
    Bands,
    Blue,
    Red,
    Green,
    Purple,
    Yellow,
    Colorful,
    RainbowSherbet,
    Canada,
    Usa,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 10] = [
        ColorScheme::Bands,
        ColorScheme::Blue,
        ColorScheme::Red,
        ColorScheme::Green,
        ColorScheme::Purple,
        ColorScheme::Yellow,
        ColorScheme::Colorful,
        ColorScheme::RainbowSherbet,
        ColorScheme::Canada,
        ColorScheme::Usa,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl Palette for ColorScheme {
    fn color_at(&self, index: u8) -> Rgb888 {
        match self {
            ColorScheme::Bands => BAND_COLORS.color_at(index),
            ColorScheme::Blue => BLUE_COLORS.color_at(index),
            ColorScheme::Red => RED_COLORS.color_at(index),
            ColorScheme::Green => GREEN_COLORS.color_at(index),
            ColorScheme::Purple => PURPLE_COLORS.color_at(index),
            ColorScheme::Yellow => YELLOW_COLORS.color_at(index),
            ColorScheme::Colorful => COLORFUL.color_at(index),
            ColorScheme::RainbowSherbet => RAINBOW_SHERBET.color_at(index),
            ColorScheme::Canada => CANADA_COLORS.color_at(index),
            ColorScheme::Usa => USA_COLORS.color_at(index),
        }
    }
}
