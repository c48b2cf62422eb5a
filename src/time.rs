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

/// A clock time, in seconds since midnight of the service day.
///
/// Times are allowed to run past 24:00:00 for services operating over
/// midnight, the same convention as gtfs/ntfs stop_times.txt.
pub type Time = i32;

/// Marks a stop or a target for which no arrival has been found.
/// This is a normal value, never an error.
pub const UNREACHED: Time = Time::MAX;

/// Renders a clock time as `HH:MM:SS` for logs and path dumps.
/// `UNREACHED` renders as the literal string "unreached".
pub fn hhmmss(time: Time) -> String {
    if time == UNREACHED {
        return "unreached".to_string();
    }
    let hours = time / 3600;
    let minutes = (time % 3600) / 60;
    let seconds = time % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmmss_handles_past_midnight_and_unreached() {
        assert_eq!(hhmmss(0), "00:00:00");
        assert_eq!(hhmmss(10 * 3600 + 5 * 60 + 3), "10:05:03");
        assert_eq!(hhmmss(24 * 3600 + 600), "24:10:00");
        assert_eq!(hhmmss(UNREACHED), "unreached");
    }
}
