// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::time::Time;
use crate::transit_data::TransitData;

/// One Monte Carlo draw of boarding phases for every frequency entry.
///
/// `offsets[pattern][trip][entry]` is how far into its headway the first
/// vehicle of that entry departs. Redrawn before each RANDOM iteration; the
/// BEST_CASE and WORST_CASE bounding iterations never read it.
pub struct FrequencyOffsets {
    offsets: Vec<Vec<Vec<Time>>>,
    rng: StdRng,
}

impl FrequencyOffsets {
    pub fn new(data: &TransitData) -> Self {
        Self::build(data, StdRng::from_entropy())
    }

    /// A seeded draw sequence, for reproducible searches.
    pub fn with_seed(data: &TransitData, seed: u64) -> Self {
        Self::build(data, StdRng::seed_from_u64(seed))
    }

    fn build(data: &TransitData, rng: StdRng) -> Self {
        let offsets = data
            .patterns
            .iter()
            .map(|pattern| {
                pattern
                    .trips
                    .iter()
                    .map(|trip| match &trip.frequency {
                        Some(entries) => vec![0; entries.len()],
                        None => Vec::new(),
                    })
                    .collect()
            })
            .collect();
        Self { offsets, rng }
    }

    /// Redraws every offset uniformly in `[0, headway)`.
    pub fn randomize(&mut self, data: &TransitData) {
        debug_assert_eq!(self.offsets.len(), data.patterns.len());
        for (pattern, pattern_offsets) in data.patterns.iter().zip(self.offsets.iter_mut()) {
            for (trip, trip_offsets) in pattern.trips.iter().zip(pattern_offsets.iter_mut()) {
                if let Some(entries) = &trip.frequency {
                    for (entry, offset) in trip_offsets.iter_mut().enumerate() {
                        *offset = self.rng.gen_range(0..entries.headway_seconds[entry]);
                    }
                }
            }
        }
    }

    pub(crate) fn offset(&self, pattern: usize, trip: usize, entry: usize) -> Time {
        self.offsets[pattern][trip][entry]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit_data::TransitDataBuilder;

    fn mixed_data() -> TransitData {
        TransitDataBuilder::new("2020-01-01", "2020-01-02")
            .service("weekday", &["2020-01-01"])
            .pattern(&["A", "B"], |pattern| {
                pattern
                    .trip("weekday", &["10:00:00", "10:10:00"])
                    .frequency_trip(
                        "weekday",
                        &["00:00:00", "00:10:00"],
                        &[("06:00:00", "10:00:00", 600), ("10:00:00", "20:00:00", 1200)],
                    );
            })
            .build()
    }

    #[test]
    fn offsets_are_sized_to_the_layer_and_drawn_within_headways() {
        let data = mixed_data();
        let mut offsets = FrequencyOffsets::with_seed(&data, 1);

        // frequency trips sort first, their offsets start at zero
        assert_eq!(offsets.offsets[0][0].len(), 2);
        assert!(offsets.offsets[0][1].is_empty());

        for _ in 0..50 {
            offsets.randomize(&data);
            let first = offsets.offset(0, 0, 0);
            let second = offsets.offset(0, 0, 1);
            assert!((0..600).contains(&first));
            assert!((0..1200).contains(&second));
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let data = mixed_data();
        let mut left = FrequencyOffsets::with_seed(&data, 42);
        let mut right = FrequencyOffsets::with_seed(&data, 42);
        for _ in 0..10 {
            left.randomize(&data);
            right.randomize(&data);
            assert_eq!(left.offsets, right.offsets);
        }
    }
}
