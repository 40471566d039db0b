use ndarray::prelude::*;

/// Solve `a x = b` for a symmetric positive definite `a` using its Cholesky decomposition. Returns `None` if `a` is not positive definite.
pub(crate) fn solve_positive_definite(mut a: Array2<f64>, b: ArrayView1<f64>) -> Option<Array1<f64>> {
	let n = a.nrows();
	// Overwrite the lower triangle of `a` with `l` where `a = l l^T`.
	for j in 0..n {
		let mut diagonal = a[[j, j]];
		for k in 0..j {
			diagonal -= a[[j, k]] * a[[j, k]];
		}
		if diagonal <= 0.0 || !diagonal.is_finite() {
			return None;
		}
		let diagonal = diagonal.sqrt();
		a[[j, j]] = diagonal;
		for i in j + 1..n {
			let mut value = a[[i, j]];
			for k in 0..j {
				value -= a[[i, k]] * a[[j, k]];
			}
			a[[i, j]] = value / diagonal;
		}
	}
	// l y = b
	let mut x = b.to_owned();
	for i in 0..n {
		let mut value = x[i];
		for k in 0..i {
			value -= a[[i, k]] * x[k];
		}
		x[i] = value / a[[i, i]];
	}
	// l^T x = y
	for i in (0..n).rev() {
		let mut value = x[i];
		for k in i + 1..n {
			value -= a[[k, i]] * x[k];
		}
		x[i] = value / a[[i, i]];
	}
	Some(x)
}

#[test]
fn test_solve_positive_definite() {
	let a = arr2(&[[4.0, 12.0, -16.0], [12.0, 37.0, -43.0], [-16.0, -43.0, 98.0]]);
	let x = arr1(&[1.0, -2.0, 0.5]);
	let b = a.dot(&x);
	let solved = solve_positive_definite(a, b.view()).unwrap();
	for (expected, actual) in x.iter().zip(solved.iter()) {
		assert!((expected - actual).abs() < 1e-9);
	}
	assert!(solve_positive_definite(arr2(&[[1.0, 2.0], [2.0, 1.0]]), arr1(&[1.0, 1.0]).view()).is_none());
}
