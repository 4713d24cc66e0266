mod common;

use approx::assert_relative_eq;
use hifitime::Epoch;
use nalgebra::{Rotation3, Vector3};

use boundary_density::{
    boundary_errors::BoundaryError,
    constants::{JUPITER_RADIUS_KM, OBLIQUITY_J2000},
    ephemeris::{naif::KernelPool, SpacecraftEphemeris},
};
use common::{utf8_path, write_spk, write_spk_records, write_text, LinearSegment};

const START: f64 = 5.0e8;
const END: f64 = 5.0e8 + 10.0 * 86_400.0;

fn sun() -> LinearSegment {
    LinearSegment::fixed(10, 0, START, END, [1.0e5, -2.0e5, 3.0e4])
}

fn jupiter_barycenter() -> LinearSegment {
    LinearSegment {
        target: 5,
        center: 0,
        frame: 1,
        start: START,
        end: END,
        origin: [-7.0e8, 2.0e8, 1.0e8],
        velocity: [1.0, -12.0, -5.0],
    }
}

fn jupiter() -> LinearSegment {
    LinearSegment::fixed(599, 5, START, END, [10.0, 20.0, -5.0])
}

fn juno() -> LinearSegment {
    LinearSegment {
        target: -61,
        center: 599,
        frame: 1,
        start: START,
        end: END,
        origin: [1.0e6, -5.0e6, 2.0e6],
        velocity: [5.0, 1.0, -2.0],
    }
}

fn vector(p: [f64; 3]) -> Vector3<f64> {
    Vector3::new(p[0], p[1], p[2])
}

fn system_kernel(dir: &tempfile::TempDir) -> camino::Utf8PathBuf {
    let path = utf8_path(dir, "system.bsp");
    write_spk(&path, &[sun(), jupiter_barycenter(), jupiter(), juno()]);
    path
}

#[test]
fn test_direct_segment_position() {
    let dir = tempfile::tempdir().unwrap();
    let pool = KernelPool::load(&[system_kernel(&dir)]).unwrap();
    assert_eq!(pool.segment_count(), 4);

    for et in [START, START + 12_345.0, (START + END) / 2.0, END] {
        let position = pool.position(-61, 599, et).unwrap();
        assert_relative_eq!(position, vector(juno().position(et)), epsilon = 1e-6);
    }
}

#[test]
fn test_chained_position_through_barycenter() {
    let dir = tempfile::tempdir().unwrap();
    let pool = KernelPool::load(&[system_kernel(&dir)]).unwrap();

    let et = START + 3.5 * 86_400.0;
    let expected = vector(sun().position(et))
        - vector(jupiter_barycenter().position(et))
        - vector(jupiter().position(et));
    assert_relative_eq!(pool.position(10, 599, et).unwrap(), expected, epsilon = 1e-4);

    // reversed pair
    assert_relative_eq!(pool.position(599, 10, et).unwrap(), -expected, epsilon = 1e-4);
}

#[test]
fn test_later_kernel_takes_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let base = system_kernel(&dir);

    let update = LinearSegment::fixed(-61, 599, START + 86_400.0, START + 2.0 * 86_400.0, [1.0, 2.0, 3.0]);
    let patch = utf8_path(&dir, "update.bsp");
    write_spk(&patch, &[update]);

    let pool = KernelPool::load(&[base, patch]).unwrap();
    let inside = START + 1.5 * 86_400.0;
    let outside = START + 5.0 * 86_400.0;
    assert_relative_eq!(pool.position(-61, 599, inside).unwrap(), Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-9);
    assert_relative_eq!(
        pool.position(-61, 599, outside).unwrap(),
        vector(juno().position(outside)),
        epsilon = 1e-6
    );
}

#[test]
fn test_segments_across_linked_summary_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = utf8_path(&dir, "linked.bsp");
    let moon = LinearSegment::fixed(-99, 599, START, END, [4.0, 5.0, 6.0]);
    // three records of two, two and one summaries
    write_spk_records(&path, &[sun(), jupiter_barycenter(), jupiter(), juno(), moon], 2);

    let pool = KernelPool::load(&[path]).unwrap();
    assert_eq!(pool.segment_count(), 5);
    assert_relative_eq!(pool.position(-99, 599, START + 10.0).unwrap(), Vector3::new(4.0, 5.0, 6.0));

    let et = START + 86_400.0;
    assert_relative_eq!(pool.position(-61, 599, et).unwrap(), vector(juno().position(et)), epsilon = 1e-6);
    let expected = vector(sun().position(et))
        - vector(jupiter_barycenter().position(et))
        - vector(jupiter().position(et));
    assert_relative_eq!(pool.position(10, 599, et).unwrap(), expected, epsilon = 1e-4);
}

#[test]
fn test_ecliptic_segment_is_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let mut ecliptic = LinearSegment::fixed(-61, 599, START, END, [0.0, 1.0e6, 0.0]);
    ecliptic.frame = 17;
    let path = utf8_path(&dir, "ecliptic.bsp");
    write_spk(&path, &[ecliptic]);

    let pool = KernelPool::load(&[path]).unwrap();
    let expected = Rotation3::from_axis_angle(&Vector3::x_axis(), OBLIQUITY_J2000) * Vector3::new(0.0, 1.0e6, 0.0);
    let position = pool.position(-61, 599, START + 10.0).unwrap();
    assert_relative_eq!(position, expected, epsilon = 1e-6);
    assert!(position.z > 0.0);
}

#[test]
fn test_no_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let pool = KernelPool::load(&[system_kernel(&dir)]).unwrap();

    assert_eq!(
        pool.position(-61, 599, END + 1.0),
        Err(BoundaryError::NoEphemerisCoverage {
            target: -61,
            center: 599,
            et_seconds: END + 1.0
        })
    );
    assert!(pool.position(-82, 599, START).is_err());
}

#[test]
fn test_invalid_kernel() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_text(&dir, "not_a_kernel.bsp", &vec!["DAF/PCK this is text".to_string(); 200]);
    assert!(matches!(
        KernelPool::load(&[path]),
        Err(BoundaryError::InvalidDafFile(_))
    ));
}

#[test]
fn test_metakernel_and_jss_position() {
    let dir = tempfile::tempdir().unwrap();
    system_kernel(&dir);
    write_text(&dir, "naif0012.tls", &["KPL/LSK".to_string()]);

    let root = dir.path().to_str().unwrap();
    let metakernel = write_text(
        &dir,
        "juno.tm",
        &[
            "KPL/MK".to_string(),
            "\\begindata".to_string(),
            format!("PATH_VALUES = ( '{root}' )"),
            "PATH_SYMBOLS = ( 'ROOT' )".to_string(),
            "KERNELS_TO_LOAD = ( '$ROOT/naif0012.tls'".to_string(),
            "                    '$ROOT/system.bsp' )".to_string(),
            "\\begintext".to_string(),
        ],
    );

    let ephemeris = SpacecraftEphemeris::from_metakernel(&metakernel).unwrap();
    let et = START + 2.0 * 86_400.0;
    let epoch = Epoch::from_et_seconds(et);
    let jss = ephemeris.jss_position(epoch).unwrap();

    let sun_from_jupiter = vector(sun().position(et))
        - vector(jupiter_barycenter().position(et))
        - vector(jupiter().position(et));
    let spacecraft = vector(juno().position(et));

    // the frame change is a rotation: norm is kept and X is the sunward projection
    assert_relative_eq!(jss.norm(), spacecraft.norm() / JUPITER_RADIUS_KM, epsilon = 1e-9);
    assert_relative_eq!(
        jss.x,
        spacecraft.dot(&sun_from_jupiter.normalize()) / JUPITER_RADIUS_KM,
        epsilon = 1e-6
    );
}

fn metakernel(dir: &tempfile::TempDir, name: &str, kernels: &[&str]) -> camino::Utf8PathBuf {
    let root = dir.path().to_str().unwrap();
    let mut lines = vec![
        "KPL/MK".to_string(),
        "\\begindata".to_string(),
        format!("PATH_VALUES = ( '{root}' )"),
        "PATH_SYMBOLS = ( 'ROOT' )".to_string(),
        "KERNELS_TO_LOAD = (".to_string(),
    ];
    lines.extend(kernels.iter().map(|kernel| format!("    '$ROOT/{kernel}'")));
    lines.push(")".to_string());
    lines.push("\\begintext".to_string());
    write_text(dir, name, &lines)
}

#[test]
fn test_planetary_and_spacecraft_metakernels() {
    let dir = tempfile::tempdir().unwrap();
    write_spk(&utf8_path(&dir, "planets.bsp"), &[sun(), jupiter_barycenter(), jupiter()]);
    write_spk(&utf8_path(&dir, "juno.bsp"), &[juno()]);
    write_text(&dir, "naif0012.tls", &["KPL/LSK".to_string()]);
    let planetary = metakernel(&dir, "planetary.tm", &["naif0012.tls", "planets.bsp"]);
    let spacecraft = metakernel(&dir, "juno.tm", &["juno.bsp"]);

    // neither meta-kernel alone places Juno relative to the Sun
    let et = START + 2.0 * 86_400.0;
    let planets_only = KernelPool::from_metakernel(&planetary).unwrap();
    assert!(planets_only.position(-61, 10, et).is_err());

    let pool = KernelPool::from_metakernels(&[&planetary, &spacecraft]).unwrap();
    assert_eq!(pool.segment_count(), 4);
    assert_eq!(pool.kernels().len(), 2);
    assert!(pool.kernels()[1].ends_with("juno.bsp"));
    let expected = vector(juno().position(et)) - vector(sun().position(et))
        + vector(jupiter_barycenter().position(et))
        + vector(jupiter().position(et));
    assert_relative_eq!(pool.position(-61, 10, et).unwrap(), expected, epsilon = 1e-4);

    // an explicit kernel given after the meta-kernels overrides them
    let update = utf8_path(&dir, "update.bsp");
    write_spk(&update, &[LinearSegment::fixed(-61, 599, START, END, [7.0, 8.0, 9.0])]);
    let ephemeris = SpacecraftEphemeris::from_kernel_sets(&[&planetary, &spacecraft], &[&update]).unwrap();
    let jss = ephemeris.jss_position(Epoch::from_et_seconds(et)).unwrap();
    assert_relative_eq!(jss.norm(), Vector3::new(7.0, 8.0, 9.0).norm() / JUPITER_RADIUS_KM, epsilon = 1e-12);
}
