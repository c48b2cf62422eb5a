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

pub mod init;

pub use init::TransitDataBuilder;

use chrono::NaiveDate;
use fixedbitset::FixedBitSet;

use crate::time::Time;

/// The flattened, pre-indexed timetable over which searches run.
///
/// Built once per network by `TransitDataBuilder` and then deeply immutable,
/// so it can be shared read-only between concurrent searches.
pub struct TransitData {
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) stops_data: Vec<StopData>,
    pub(crate) calendar: ServiceCalendar,

    /// True if any pattern carries at least one frequency trip.
    pub(crate) has_frequencies: bool,
    /// True if any pattern carries at least one scheduled trip.
    pub(crate) has_schedules: bool,
}

/// A unique ordered sequence of stops, shared by one or more trips.
pub struct Pattern {
    /// Global stop indices, in travel order.
    pub(crate) stops: Vec<usize>,

    /// Trips over this pattern, sorted by departure time at every stop
    /// position. A pattern may mix scheduled and frequency trips; each
    /// sub-pass of a round skips the trips of the other kind.
    pub(crate) trips: Vec<TripData>,

    /// True if any trip of this pattern is frequency-based.
    pub(crate) has_frequencies: bool,

    /// Union of the service codes of the trips of this pattern.
    /// A pattern whose services do not intersect the day's active services
    /// is skipped wholesale, which can double or triple search speed.
    pub(crate) services: FixedBitSet,
}

/// A single vehicle run over a pattern.
pub struct TripData {
    /// `arrivals[position]` is the arrival time at the stop at `position`
    /// in the pattern. For a frequency trip these are offsets from the
    /// start of the run rather than clock times.
    pub(crate) arrivals: Vec<Time>,

    /// `departures[position]`, same convention as `arrivals`.
    pub(crate) departures: Vec<Time>,

    /// Service code, an index into the calendar.
    pub(crate) service: usize,

    /// `None` for a scheduled trip.
    pub(crate) frequency: Option<FrequencyEntries>,
}

/// The frequency entries of one trip: parallel arrays of
/// (start, end, headway) triples describing runs of anonymous vehicles.
///
/// Entries are expected to be non-overlapping within a trip. Overlapping
/// entries are tolerated but boarding then treats them as uncorrelated,
/// which is a known approximation.
pub struct FrequencyEntries {
    pub(crate) start_times: Vec<Time>,
    pub(crate) end_times: Vec<Time>,
    pub(crate) headway_seconds: Vec<Time>,
}

impl FrequencyEntries {
    pub fn len(&self) -> usize {
        self.headway_seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headway_seconds.is_empty()
    }
}

/// Per-stop indexes into the rest of the layer.
pub struct StopData {
    /// Indices of the patterns passing through this stop.
    pub(crate) patterns: Vec<usize>,

    /// Outgoing transfers as (to_stop, distance in meters) pairs.
    pub(crate) transfers: Vec<(usize, u32)>,
}

impl TransitData {
    pub fn nb_of_stops(&self) -> usize {
        self.stops_data.len()
    }

    pub fn nb_of_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn has_frequencies(&self) -> bool {
        self.has_frequencies
    }

    pub fn has_schedules(&self) -> bool {
        self.has_schedules
    }

    pub fn calendar(&self) -> &ServiceCalendar {
        &self.calendar
    }

    /// The set of service codes running on `date`. Empty when `date` falls
    /// outside the calendar.
    pub fn active_services_on(&self, date: NaiveDate) -> FixedBitSet {
        self.calendar.active_services_on(date)
    }

    pub(crate) fn pattern(&self, pattern: usize) -> &Pattern {
        &self.patterns[pattern]
    }

    pub(crate) fn stop_data(&self, stop: usize) -> &StopData {
        &self.stops_data[stop]
    }
}

/// Which services run on which day of the data validity period.
///
/// `active_days_per_service[service][day_offset]` tells whether `service`
/// runs `day_offset` days after `first_date`.
pub struct ServiceCalendar {
    first_date: NaiveDate,
    nb_of_days: u16,
    active_days_per_service: Vec<Vec<bool>>,
}

impl ServiceCalendar {
    pub(crate) fn new(
        first_date: NaiveDate,
        nb_of_days: u16,
        active_days_per_service: Vec<Vec<bool>>,
    ) -> Self {
        debug_assert!(active_days_per_service
            .iter()
            .all(|days| days.len() == nb_of_days as usize));
        Self {
            first_date,
            nb_of_days,
            active_days_per_service,
        }
    }

    pub fn nb_of_services(&self) -> usize {
        self.active_days_per_service.len()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    fn date_to_offset(&self, date: NaiveDate) -> Option<usize> {
        let days = date.signed_duration_since(self.first_date).num_days();
        if days >= 0 && days < i64::from(self.nb_of_days) {
            Some(days as usize)
        } else {
            None
        }
    }

    pub fn active_services_on(&self, date: NaiveDate) -> FixedBitSet {
        let mut services = FixedBitSet::with_capacity(self.nb_of_services());
        if let Some(offset) = self.date_to_offset(date) {
            for (service, active_days) in self.active_days_per_service.iter().enumerate() {
                if active_days[offset] {
                    services.set(service, true);
                }
            }
        }
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_services_follow_the_calendar() {
        let first_date = NaiveDate::from_ymd(2020, 1, 1);
        let calendar = ServiceCalendar::new(
            first_date,
            2,
            vec![vec![true, false], vec![false, true], vec![true, true]],
        );

        let day_one = calendar.active_services_on(first_date);
        assert!(day_one.contains(0));
        assert!(!day_one.contains(1));
        assert!(day_one.contains(2));

        let day_two = calendar.active_services_on(NaiveDate::from_ymd(2020, 1, 2));
        assert!(!day_two.contains(0));
        assert!(day_two.contains(1));

        let outside = calendar.active_services_on(NaiveDate::from_ymd(2020, 2, 1));
        assert_eq!(outside.count_ones(..), 0);
    }
}
