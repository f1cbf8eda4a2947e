use chrono::{Datelike, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use solpaper::geo::location::timezone_from_coordinates;
use solpaper::geo::{Astronomical, Location, LocationError, SolarCalculator, SolarEvent};

fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2040, 1u32..=365).prop_map(|(year, ordinal)| {
        NaiveDate::from_yo_opt(year, ordinal).expect("ordinal within every year")
    })
}

/// Coordinates that are very likely on land.
fn land_coordinates_strategy() -> impl Strategy<Value = (f64, f64)> {
    prop_oneof![
        // North America
        (25.0..50.0, -125.0..-70.0),
        // Europe
        (36.0..60.0, -5.0..30.0),
        // Australia
        (-35.0..-20.0, 120.0..150.0),
    ]
}

mod timezone_lookup {
    use super::*;

    proptest! {
        #[test]
        fn test_lookup_never_panics(lat in latitude_strategy(), lon in longitude_strategy()) {
            let _ = timezone_from_coordinates(lat, lon);
        }

        #[test]
        fn test_major_cities(city_index in 0..10usize) {
            let cities = [
                (40.7128, -74.0060, "America/New_York"),
                (51.5074, -0.1278, "Europe/London"),
                (35.6762, 139.6503, "Asia/Tokyo"),
                (-33.8688, 151.2093, "Australia/Sydney"),
                (34.0522, -118.2437, "America/Los_Angeles"),
                (41.8781, -87.6298, "America/Chicago"),
                (48.8566, 2.3522, "Europe/Paris"),
                (55.7558, 37.6173, "Europe/Moscow"),
                (28.6139, 77.2090, "Asia/Kolkata"),
                (-23.5505, -46.6333, "America/Sao_Paulo"),
            ];

            let (lat, lon, expected) = cities[city_index];
            let expected: Tz = expected.parse().unwrap();
            prop_assert_eq!(timezone_from_coordinates(lat, lon), expected);
        }

        #[test]
        fn test_offsets_are_plausible((lat, lon) in land_coordinates_strategy()) {
            let tz = timezone_from_coordinates(lat, lon);
            let offset = tz.offset_from_utc_datetime(&Utc::now().naive_utc());
            let hours = offset.fix().local_minus_utc() as f64 / 3600.0;
            prop_assert!((-12.0..=14.0).contains(&hours), "{hours} h at ({lat}, {lon})");
        }
    }
}

mod location_validation {
    use super::*;

    proptest! {
        #[test]
        fn test_in_range_coordinates_accepted(
            lat in latitude_strategy(),
            lon in longitude_strategy()
        ) {
            let location = Location::new(lat, lon, Tz::UTC).unwrap();
            prop_assert!(location.has_coordinates());
        }

        #[test]
        fn test_out_of_range_latitude_rejected(
            lat in prop_oneof![90.0001..1000.0, -1000.0..-90.0001],
            lon in longitude_strategy()
        ) {
            prop_assert_eq!(
                Location::new(lat, lon, Tz::UTC),
                Err(LocationError::InvalidLatitude(lat))
            );
        }

        #[test]
        fn test_out_of_range_longitude_rejected(
            lat in latitude_strategy(),
            lon in prop_oneof![180.0001..1000.0, -1000.0..-180.0001]
        ) {
            prop_assert_eq!(
                Location::new(lat, lon, Tz::UTC),
                Err(LocationError::InvalidLongitude(lon))
            );
        }
    }
}

mod polar_regions {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Whatever the latitude, every reported event lies on the requested
        /// local date and midnight is always there.
        #[test]
        fn test_events_stay_on_date_everywhere(
            lat in prop_oneof![60.0..=90.0, -90.0..=-60.0],
            lon in longitude_strategy(),
            date in date_strategy()
        ) {
            let location = Location::new(lat, lon, Tz::UTC).unwrap();
            let events = Astronomical.resolve_events(date, &location).unwrap();

            prop_assert!(events.is_defined(SolarEvent::Midnight));
            for (event, at) in events.iter() {
                if let Some(at) = at {
                    prop_assert_eq!(at.date_naive(), date, "{} at {}", event, at);
                }
            }
        }
    }

    #[test]
    fn test_north_pole_midsummer_has_no_sunset() {
        let location = Location::new(89.9, 0.0, Tz::UTC).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let events = Astronomical.resolve_events(date, &location).unwrap();
        assert_eq!(date.month(), 6);
        assert!(!events.is_defined(SolarEvent::Sunset));
        assert!(!events.is_defined(SolarEvent::Sunrise));
        assert!(!events.is_defined(SolarEvent::Dusk));
    }
}
