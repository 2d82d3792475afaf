//! Round-trip properties of the equatorial/horizontal transforms

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use pointtosky::coordinates::angle::{haversine_separation_deg, wrap_0_360, wrap_signed_180};
use pointtosky::transform::{equatorial_to_horizontal, horizontal_to_equatorial, refraction_deg, Meteo};
use pointtosky::Equatorial;

const LST_DEG: f64 = 100.0;

#[rstest]
fn test_roundtrip_grid(
    #[values(-60.0, 0.0, 60.0)] lat: f64,
    #[values(-60.0, 0.0, 60.0)] dec: f64,
    #[values(-150.0, -120.0, -90.0, -60.0, -30.0, 0.0, 30.0, 60.0, 90.0, 120.0, 150.0)] tau: f64,
) {
    let eq = Equatorial::new(LST_DEG - tau, dec);
    let hor = equatorial_to_horizontal(&eq, LST_DEG, lat, false, None);
    let back = horizontal_to_equatorial(&hor, LST_DEG, lat);

    assert_abs_diff_eq!(wrap_signed_180(back.ra_deg - eq.ra_deg), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(back.dec_deg, dec, epsilon = 1e-6);
    assert!((0.0..360.0).contains(&hor.az_deg));
    assert!((-90.0..=90.0).contains(&hor.alt_deg));

    let again = equatorial_to_horizontal(&back, LST_DEG, lat, false, None);
    assert_abs_diff_eq!(again.alt_deg, hor.alt_deg, epsilon = 1e-6);
    // Azimuth is undefined at the zenith
    if hor.alt_deg.abs() < 89.9 {
        assert_abs_diff_eq!(wrap_signed_180(again.az_deg - hor.az_deg), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_roundtrip_random() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..10_000 {
        let lat = rng.gen_range(-80.0..80.0);
        let lst = rng.gen_range(0.0..360.0);
        let eq = Equatorial::new(rng.gen_range(0.0..360.0), rng.gen_range(-80.0..80.0));

        let hor = equatorial_to_horizontal(&eq, lst, lat, false, None);
        let back = horizontal_to_equatorial(&hor, lst, lat);
        let error = haversine_separation_deg(&eq, &back);
        assert!(error < 1e-6, "lat {} lst {} {:?} -> {:?}", lat, lst, eq, back);
    }
}

#[rstest]
#[case(-60.0)]
#[case(0.0)]
#[case(45.0)]
fn test_refraction_only_raises(#[case] lat: f64) {
    let meteo = Meteo::default();
    for tau in (-170..=170).step_by(10) {
        let eq = Equatorial::new(wrap_0_360(LST_DEG - tau as f64), 20.0);
        let plain = equatorial_to_horizontal(&eq, LST_DEG, lat, false, None);
        let refracted = equatorial_to_horizontal(&eq, LST_DEG, lat, true, Some(&meteo));

        assert_abs_diff_eq!(refracted.az_deg, plain.az_deg, epsilon = 1e-9);
        assert!(refracted.alt_deg >= plain.alt_deg);
        if plain.alt_deg > 0.0 {
            assert_abs_diff_eq!(
                refracted.alt_deg - plain.alt_deg,
                refraction_deg(plain.alt_deg, &meteo),
                epsilon = 1e-9
            );
        }
    }
}
