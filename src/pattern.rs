// SPDX-License-Identifier: Apache-2.0
//! Mapping pixels to the subpage that measures them.
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::register::Subpage;
use crate::{NUM_PIXELS, WIDTH};

/// The pixel access pattern used by the camera.
///
/// Every measurement covers only half of the pixels; the access pattern decides which half.
/// Which pattern is active is part of the [control register][crate::ControlRegister], so the
/// same frame data can be split either way and the classification here has to agree with the
/// camera's configuration.
///
/// The discriminants match the control register encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AccessPattern {
    /// Pixels alternate between subpages in a chess (checker) board pattern.
    ///
    /// This is the factory default, and the only mode the manufacturer recommends for this
    /// camera.
    Chess = 1,

    /// Each row of pixels is in the same subpage, with rows alternating between subpages.
    Interleaved = 0,
}

impl AccessPattern {
    /// The subpage that measures the pixel at the given coordinates.
    pub fn classify(&self, row: usize, column: usize) -> Subpage {
        let parity = match self {
            Self::Chess => (row + column) % 2,
            Self::Interleaved => row % 2,
        };
        if parity == 0 {
            Subpage::Zero
        } else {
            Subpage::One
        }
    }

    /// The subpage that measures the pixel at the given row-major index.
    pub fn classify_index(&self, index: usize) -> Subpage {
        self.classify(index / WIDTH, index % WIDTH)
    }

    /// The coordinates of the pixels a subpage measures, in row-major order.
    pub fn pixel_coordinates(
        &self,
        subpage: Subpage,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let pattern = *self;
        (0..NUM_PIXELS)
            .map(|index| (index / WIDTH, index % WIDTH))
            .filter(move |(row, column)| pattern.classify(*row, *column) == subpage)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::HEIGHT;

    #[test]
    fn chess_alternates_along_rows() {
        assert_eq!(AccessPattern::Chess.classify(0, 0), Subpage::Zero);
        assert_eq!(AccessPattern::Chess.classify(0, 1), Subpage::One);
        assert_eq!(AccessPattern::Chess.classify(1, 0), Subpage::One);
        assert_eq!(AccessPattern::Chess.classify(1, 1), Subpage::Zero);
    }

    #[test]
    fn interleaved_alternates_by_row() {
        for column in 0..WIDTH {
            assert_eq!(AccessPattern::Interleaved.classify(0, column), Subpage::Zero);
            assert_eq!(AccessPattern::Interleaved.classify(1, column), Subpage::One);
        }
    }

    #[test]
    fn every_pixel_in_exactly_one_subpage() {
        // The two subpages partition the array, whichever pattern is active.
        for pattern in [AccessPattern::Chess, AccessPattern::Interleaved] {
            let mut seen = [0u8; NUM_PIXELS];
            for (row, column) in pattern.pixel_coordinates(Subpage::Zero) {
                seen[row * WIDTH + column] += 1;
            }
            for (row, column) in pattern.pixel_coordinates(Subpage::One) {
                seen[row * WIDTH + column] += 1;
            }
            assert!(seen.iter().all(|&count| count == 1), "{:?}", pattern);
        }
    }

    #[test]
    fn subpages_are_equal_halves() {
        for pattern in [AccessPattern::Chess, AccessPattern::Interleaved] {
            let count = pattern.pixel_coordinates(Subpage::Zero).count();
            assert_eq!(count, NUM_PIXELS / 2, "{:?}", pattern);
        }
    }

    #[test]
    fn classify_index_matches_coordinates() {
        for pattern in [AccessPattern::Chess, AccessPattern::Interleaved] {
            for row in 0..HEIGHT {
                for column in 0..WIDTH {
                    assert_eq!(
                        pattern.classify_index(row * WIDTH + column),
                        pattern.classify(row, column)
                    );
                }
            }
        }
    }
}
