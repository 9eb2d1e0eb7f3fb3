use rand::Rng;
use serde::Serialize;

/// Images served by the `json` endpoint, as `(header, url)` pairs.
pub static IMAGES: &[(&str, &str)] = &[
    ("streets", "https://iili.io/JV1pSV.jpg"),
    ("bread", "https://iili.io/Jj9MWG.jpg"),
];

/// Chooses which entry of [`IMAGES`] the `json` endpoint returns.
pub trait ImagePicker: Send + Sync + 'static {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice using the calling thread's RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngPicker;

impl ImagePicker for ThreadRngPicker {
    #[inline]
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index, modulo the table size.
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl ImagePicker for FixedPicker {
    #[inline]
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Body of the `json` endpoint: `{"header":"<name>","image":"<url>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageCard {
    pub header: &'static str,
    pub image: &'static str,
}

impl ImageCard {
    pub fn pick<P: ImagePicker + ?Sized>(picker: &P) -> Self {
        let (header, image) = IMAGES[picker.pick(IMAGES.len())];
        Self { header, image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_json() {
        let card = ImageCard::pick(&FixedPicker(0));

        assert_eq!(
            serde_json::to_string(&card).unwrap(),
            r#"{"header":"streets","image":"https://iili.io/JV1pSV.jpg"}"#
        );
        assert_eq!(ImageCard::pick(&FixedPicker(3)).header, "bread");
    }

    #[test]
    fn thread_rng_stays_in_table() {
        let mut seen = [false; 2];

        for _ in 0..256 {
            let card = ImageCard::pick(&ThreadRngPicker);
            let index = IMAGES
                .iter()
                .position(|(header, _)| *header == card.header)
                .unwrap();
            seen[index] = true;
        }

        assert_eq!(seen, [true, true]);
    }
}
