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

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use fixedbitset::FixedBitSet;
use tracing::info;

use crate::time::Time;
use crate::transit_data::{
    FrequencyEntries, Pattern, ServiceCalendar, StopData, TransitData, TripData,
};

/// Assembles a `TransitData` from named stops and services.
///
/// Stops are registered on first use and addressed by name; times are
/// `HH:MM:SS` strings, allowed past 24:00:00 for services running over
/// midnight. Misuse (unknown service, malformed time, mismatched stop
/// counts) panics: this is a construction surface for ingestion code and
/// tests, not a request path.
///
/// ```
/// use hugin::transit_data::TransitDataBuilder;
///
/// let data = TransitDataBuilder::new("2020-01-01", "2020-01-02")
///     .service("weekday", &["2020-01-01"])
///     .pattern(&["A", "B"], |pattern| {
///         pattern.trip("weekday", &["10:00:00", "10:05:00"]);
///     })
///     .build();
/// assert_eq!(data.nb_of_stops(), 2);
/// ```
pub struct TransitDataBuilder {
    first_date: NaiveDate,
    nb_of_days: u16,
    service_ids: HashMap<String, usize>,
    active_days_per_service: Vec<Vec<bool>>,
    stop_ids: HashMap<String, usize>,
    nb_of_stops: usize,
    patterns: Vec<Pattern>,
    transfers: Vec<(usize, usize, u32)>,
}

impl TransitDataBuilder {
    /// `first_date` and `last_date` (inclusive) bound the validity period,
    /// as `YYYY-MM-DD`.
    pub fn new(first_date: &str, last_date: &str) -> Self {
        let first_date = parse_date(first_date);
        let last_date = parse_date(last_date);
        let nb_of_days = last_date.signed_duration_since(first_date).num_days() + 1;
        assert!(
            nb_of_days > 0,
            "invalid validity period : {} .. {}",
            first_date,
            last_date
        );
        Self {
            first_date,
            nb_of_days: nb_of_days as u16,
            service_ids: HashMap::new(),
            active_days_per_service: Vec::new(),
            stop_ids: HashMap::new(),
            nb_of_stops: 0,
            patterns: Vec::new(),
            transfers: Vec::new(),
        }
    }

    /// Declares a service running on the given dates. Dates outside the
    /// validity period are ignored.
    pub fn service(mut self, name: &str, dates: &[&str]) -> Self {
        let mut active_days = vec![false; self.nb_of_days as usize];
        for date in dates {
            let date = parse_date(date);
            let offset = date.signed_duration_since(self.first_date).num_days();
            if offset >= 0 && offset < i64::from(self.nb_of_days) {
                active_days[offset as usize] = true;
            }
        }
        let service = self.active_days_per_service.len();
        self.active_days_per_service.push(active_days);
        self.service_ids.insert(name.to_string(), service);
        self
    }

    /// Declares a pattern over the given stop sequence and configures its
    /// trips through the closure.
    pub fn pattern<F>(mut self, stops: &[&str], config: F) -> Self
    where
        F: FnOnce(&mut PatternBuilder),
    {
        let stop_indices: Vec<usize> = stops.iter().map(|name| self.stop_index(name)).collect();
        let mut pattern_builder = PatternBuilder {
            nb_of_positions: stop_indices.len(),
            service_ids: &self.service_ids,
            trips: Vec::new(),
        };
        config(&mut pattern_builder);
        let mut trips = pattern_builder.trips;

        // Keep trips sorted by departure time at every position. Sorting on
        // the first departure is enough under the no-overtaking invariant.
        trips.sort_by_key(|trip| trip.departures[0]);
        debug_assert!(no_overtaking(&trips));

        let has_frequencies = trips.iter().any(|trip| trip.frequency.is_some());
        let mut services = FixedBitSet::with_capacity(self.active_days_per_service.len());
        for trip in &trips {
            services.set(trip.service, true);
        }
        self.patterns.push(Pattern {
            stops: stop_indices,
            trips,
            has_frequencies,
            services,
        });
        self
    }

    /// Registers a stop that no pattern serves, for networks where some
    /// stops are only reached on the street.
    pub fn stop(mut self, name: &str) -> Self {
        self.stop_index(name);
        self
    }

    /// Declares a directed transfer edge of `distance_meters`.
    pub fn transfer(mut self, from: &str, to: &str, distance_meters: u32) -> Self {
        let from = self.stop_index(from);
        let to = self.stop_index(to);
        self.transfers.push((from, to, distance_meters));
        self
    }

    /// The index assigned to a stop name, registering it on first use.
    pub fn stop_index(&mut self, name: &str) -> usize {
        if let Some(&index) = self.stop_ids.get(name) {
            return index;
        }
        let index = self.nb_of_stops;
        self.stop_ids.insert(name.to_string(), index);
        self.nb_of_stops += 1;
        index
    }

    pub fn build(self) -> TransitData {
        let mut stops_data: Vec<StopData> = (0..self.nb_of_stops)
            .map(|_| StopData {
                patterns: Vec::new(),
                transfers: Vec::new(),
            })
            .collect();

        for (pattern_index, pattern) in self.patterns.iter().enumerate() {
            for &stop in &pattern.stops {
                let patterns = &mut stops_data[stop].patterns;
                if !patterns.contains(&pattern_index) {
                    patterns.push(pattern_index);
                }
            }
        }
        for (from, to, distance) in self.transfers {
            stops_data[from].transfers.push((to, distance));
        }

        let has_frequencies = self.patterns.iter().any(|pattern| pattern.has_frequencies);
        let has_schedules = self
            .patterns
            .iter()
            .any(|pattern| pattern.trips.iter().any(|trip| trip.frequency.is_none()));

        let nb_of_trips: usize = self.patterns.iter().map(|pattern| pattern.trips.len()).sum();
        info!(
            "transit data built : {} stops, {} patterns, {} trips",
            self.nb_of_stops,
            self.patterns.len(),
            nb_of_trips,
        );

        TransitData {
            patterns: self.patterns,
            stops_data,
            calendar: ServiceCalendar::new(
                self.first_date,
                self.nb_of_days,
                self.active_days_per_service,
            ),
            has_frequencies,
            has_schedules,
        }
    }
}

/// Collects the trips of one pattern.
pub struct PatternBuilder<'a> {
    nb_of_positions: usize,
    service_ids: &'a HashMap<String, usize>,
    trips: Vec<TripData>,
}

impl PatternBuilder<'_> {
    /// A scheduled trip with one `HH:MM:SS` time per stop, used both as
    /// arrival and departure.
    pub fn trip(&mut self, service: &str, stop_times: &[&str]) -> &mut Self {
        let times: Vec<Time> = stop_times.iter().map(|s| parse_time(s)).collect();
        self.push_trip(service, times.clone(), times, None)
    }

    /// A scheduled trip with distinct (arrival, departure) times per stop.
    pub fn trip_detailed(&mut self, service: &str, stop_times: &[(&str, &str)]) -> &mut Self {
        let arrivals = stop_times.iter().map(|(a, _)| parse_time(a)).collect();
        let departures = stop_times.iter().map(|(_, d)| parse_time(d)).collect();
        self.push_trip(service, arrivals, departures, None)
    }

    /// A frequency trip. `stop_offsets` are travel times from the start of a
    /// run, one per stop; `entries` are (start, end, headway-seconds)
    /// triples, the start and end as `HH:MM:SS`.
    pub fn frequency_trip(
        &mut self,
        service: &str,
        stop_offsets: &[&str],
        entries: &[(&str, &str, Time)],
    ) -> &mut Self {
        let offsets: Vec<Time> = stop_offsets.iter().map(|s| parse_time(s)).collect();
        let frequency = FrequencyEntries {
            start_times: entries.iter().map(|(start, _, _)| parse_time(start)).collect(),
            end_times: entries.iter().map(|(_, end, _)| parse_time(end)).collect(),
            headway_seconds: entries.iter().map(|&(_, _, headway)| headway).collect(),
        };
        assert!(
            frequency.headway_seconds.iter().all(|&headway| headway > 0),
            "frequency entries need a positive headway"
        );
        self.push_trip(service, offsets.clone(), offsets, Some(frequency))
    }

    fn push_trip(
        &mut self,
        service: &str,
        arrivals: Vec<Time>,
        departures: Vec<Time>,
        frequency: Option<FrequencyEntries>,
    ) -> &mut Self {
        assert_eq!(
            arrivals.len(),
            self.nb_of_positions,
            "trip has {} stop times but the pattern has {} stops",
            arrivals.len(),
            self.nb_of_positions
        );
        let service = *self
            .service_ids
            .get(service)
            .unwrap_or_else(|| panic!("unknown service : `{}`", service));
        self.trips.push(TripData {
            arrivals,
            departures,
            service,
            frequency,
        });
        self
    }
}

fn no_overtaking(trips: &[TripData]) -> bool {
    let scheduled: Vec<&TripData> = trips.iter().filter(|t| t.frequency.is_none()).collect();
    scheduled.windows(2).all(|pair| {
        pair[0]
            .departures
            .iter()
            .zip(pair[1].departures.iter())
            .all(|(earlier, later)| earlier <= later)
    })
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap_or_else(|_| panic!("bad date : `{}`", s))
}

/// Parses `HH:MM:SS`, with hours allowed to run past 24 for times on the
/// following day.
fn parse_time(s: &str) -> Time {
    let mut parts = s.split(':');
    let mut next = || -> Time {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(|| panic!("bad time : `{}`", s))
    };
    let (hours, minutes, seconds) = (next(), next(), next());
    assert!(
        (0..60).contains(&minutes) && (0..60).contains(&seconds),
        "bad time : `{}`",
        s
    );
    hours * 3600 + minutes * 60 + seconds
}
