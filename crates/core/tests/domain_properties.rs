//! Randomised checks of mesh block sizing
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrain2fds_core::{size_domain, ExportError, Extent};

#[test]
fn test_domain_sizing_invariants() {
    let mut rng = StdRng::seed_from_u64(0x7e22a1);
    let mut sized = 0;

    for _ in 0..2000 {
        let width = rng.random_range(50.0..20_000.0);
        let height = rng.random_range(50.0..20_000.0);
        let x0 = rng.random_range(-10_000.0..0.0);
        let y0 = rng.random_range(-10_000.0..0.0);
        let z0 = rng.random_range(-50.0..3000.0);
        let relief = rng.random_range(0.0..800.0);
        let nmesh = rng.random_range(1..=64);
        let cell_size = rng.random_range(1.0..40.0);

        let extent = Extent::new(x0, x0 + width, y0, y0 + height);
        let domain = match size_domain(&extent, (z0, z0 + relief), nmesh, cell_size) {
            Ok(domain) => domain,
            Err(ExportError::CellSizeTooCoarse { block_size, .. }) => {
                assert!(block_size < cell_size);
                continue;
            }
            Err(e) => panic!("unexpected error {e}"),
        };
        sized += 1;

        assert!(domain.mesh_count() >= 1);
        assert!(domain.mesh_count() <= nmesh, "{domain:?}");
        assert_eq!(domain.requested_meshes, nmesh);

        let [bx, by, bz] = domain.block_size();
        let tolerance = 1e-6 * width.max(height);
        assert!((bx * f64::from(domain.nmesh_x) - width).abs() < tolerance);
        assert!((by * f64::from(domain.nmesh_y) - height).abs() < tolerance);
        assert!((domain.z_max() - domain.z_min() - bz).abs() < 1e-9);
        assert_eq!(domain.mesh_xb[0], domain.xb[0]);
        assert_eq!(domain.mesh_xb[2], domain.xb[2]);

        assert!(domain.ijk.iter().all(|&n| n >= 1));
        for (cells, size) in domain.ijk.iter().zip([bx, by, bz]) {
            assert!(f64::from(*cells) * cell_size <= size + 1e-9);
        }

        assert_eq!(domain.z_min(), z0 - 2.0);
        assert_eq!(domain.z_max(), z0 + relief + 10.0 * cell_size);
    }

    assert!(sized > 1000, "only {sized} domains sized");
}

#[test]
fn test_square_domains_use_square_block_grids() {
    for (nmesh, expected) in [(1, (1, 1)), (4, (2, 2)), (9, (3, 3)), (16, (4, 4))] {
        let extent = Extent::new(0.0, 2000.0, 0.0, 2000.0);
        let domain = size_domain(&extent, (0.0, 10.0), nmesh, 10.0).unwrap();
        assert_eq!((domain.nmesh_x, domain.nmesh_y), expected);
    }
}

#[test]
fn test_extreme_aspect_ratio_keeps_one_row() {
    // Much wider than tall: the y count rounds to zero and is clamped
    let extent = Extent::new(0.0, 50_000.0, 0.0, 100.0);
    let domain = size_domain(&extent, (0.0, 10.0), 4, 5.0).unwrap();
    assert_eq!(domain.nmesh_y, 1);
    assert_eq!(domain.nmesh_x, 4);

    // Much taller than wide: every block stacked along y
    let extent = Extent::new(0.0, 100.0, 0.0, 50_000.0);
    let domain = size_domain(&extent, (0.0, 10.0), 4, 5.0).unwrap();
    assert_eq!((domain.nmesh_x, domain.nmesh_y), (1, 4));
}
