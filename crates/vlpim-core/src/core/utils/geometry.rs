use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};

/// A rigid-body transform mapping a mobile point set onto a reference one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub rmsd: f64,
}

impl Superposition {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Per-atom distances after applying `transform` to `mobile`.
pub fn deviations(
    reference: &[Point3<f64>],
    mobile: &[Point3<f64>],
    transform: &Superposition,
) -> Vec<f64> {
    reference
        .iter()
        .zip(mobile.iter())
        .map(|(r, m)| (r - transform.apply(m)).norm())
        .collect()
}

fn centered(points: &[Point3<f64>]) -> Option<(Point3<f64>, Vec<Vector3<f64>>)> {
    let c = centroid(points)?;
    Some((c, points.iter().map(|p| p - c).collect()))
}

fn finish(
    reference: &[Point3<f64>],
    mobile: &[Point3<f64>],
    rotation: Rotation3<f64>,
    reference_centroid: Point3<f64>,
    mobile_centroid: Point3<f64>,
) -> Option<Superposition> {
    let translation = reference_centroid.coords - rotation * mobile_centroid.coords;
    let moved: Vec<Point3<f64>> = mobile.iter().map(|p| rotation * p + translation).collect();
    let rmsd = calculate_rmsd(reference, &moved)?;
    Some(Superposition {
        rotation,
        translation,
        rmsd,
    })
}

/// Optimal rotation of `mobile` onto `reference` via SVD of the
/// cross-covariance matrix (Kabsch), with reflection correction.
///
/// Returns `None` for empty or mismatched sets, or when the decomposition
/// does not yield both singular vector matrices.
pub fn superpose(reference: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Superposition> {
    if reference.len() != mobile.len() || reference.is_empty() {
        return None;
    }
    let (to_centroid, centered_to) = centered(reference)?;
    let (from_centroid, centered_from) = centered(mobile)?;

    let h = centered_from
        .iter()
        .zip(centered_to.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| acc + t * f.transpose());

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let d = (u * v_t).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    finish(reference, mobile, rotation, to_centroid, from_centroid)
}

/// Best-fit superposition from the unit quaternion maximizing Horn's
/// 4x4 key matrix.
pub fn superpose_quaternion(
    reference: &[Point3<f64>],
    mobile: &[Point3<f64>],
) -> Option<Superposition> {
    if reference.len() != mobile.len() || reference.is_empty() {
        return None;
    }
    let (to_centroid, centered_to) = centered(reference)?;
    let (from_centroid, centered_from) = centered(mobile)?;

    // S[i][j] = sum(mobile_i * reference_j)
    let s = centered_from
        .iter()
        .zip(centered_to.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| acc + f * t.transpose());
    let (sxx, sxy, sxz) = (s[(0, 0)], s[(0, 1)], s[(0, 2)]);
    let (syx, syy, syz) = (s[(1, 0)], s[(1, 1)], s[(1, 2)]);
    let (szx, szy, szz) = (s[(2, 0)], s[(2, 1)], s[(2, 2)]);

    #[rustfmt::skip]
    let n = Matrix4::new(
        sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,        -sxx + syy - szz, syz + szy,
        sxy - syx,       szx + sxz,        syz + szy,        -sxx - syy + szz,
    );

    let eigen = n.symmetric_eigen();
    let (max_index, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    let q = eigen.eigenvectors.column(max_index);
    let quaternion = Quaternion::new(q[0], q[1], q[2], q[3]);
    if !quaternion.norm().is_finite() || quaternion.norm() == 0.0 {
        return None;
    }
    let rotation = UnitQuaternion::from_quaternion(quaternion).to_rotation_matrix();
    finish(reference, mobile, rotation, to_centroid, from_centroid)
}
