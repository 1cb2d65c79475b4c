// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Marching tetrahedra lookup tables
//!
//! Each cube cell is split into six tetrahedra sharing the main diagonal from
//! corner 0 to corner 7. Every cube face is then cut along the diagonal from
//! its lowest to its highest corner, the same way in both cells that share
//! it, so the surface is closed across cells without any ambiguity choice.
//!
//! Corner `c` of a cell sits at offset `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`.

use std::sync::OnceLock;

/// Tetrahedra as cube corner indices
pub const TETRAHEDRA: [[u8; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// A cube edge as a pair of corner indices
pub type CornerEdge = [u8; 2];

/// Up to two triangles, each given by the three cube edges its vertices lie on
#[derive(Debug, Clone, Copy, Default)]
pub struct TetCase {
    pub triangles: [[CornerEdge; 3]; 2],
    pub count: u8,
}

impl TetCase {
    pub fn triangles(&self) -> &[[CornerEdge; 3]] {
        &self.triangles[..self.count as usize]
    }
}

/// `case_table()[tet][mask]`, where bit `i` of `mask` marks vertex `i` of the
/// tetrahedron as inside
pub fn case_table() -> &'static [[TetCase; 16]; 6] {
    static TABLE: OnceLock<[[TetCase; 16]; 6]> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn corner_offset(c: u8) -> [i32; 3] {
    [(c & 1) as i32, ((c >> 1) & 1) as i32, ((c >> 2) & 1) as i32]
}

fn build_table() -> [[TetCase; 16]; 6] {
    let mut table = [[TetCase::default(); 16]; 6];
    for (t, tet) in TETRAHEDRA.iter().enumerate() {
        for mask in 0..16u8 {
            table[t][mask as usize] = build_case(tet, mask);
        }
    }
    table
}

fn build_case(tet: &[u8; 4], mask: u8) -> TetCase {
    let inside: Vec<u8> = (0..4).filter(|i| mask & (1 << i) != 0).map(|i| tet[i]).collect();
    let outside: Vec<u8> = (0..4).filter(|i| mask & (1 << i) == 0).map(|i| tet[i]).collect();

    let raw: Vec<[CornerEdge; 3]> = match (inside.as_slice(), outside.as_slice()) {
        // One vertex separated from the other three
        ([a], [b, c, d]) | ([b, c, d], [a]) => vec![[[*a, *b], [*a, *c], [*a, *d]]],
        // Quad between the two inside and the two outside vertices
        ([a, b], [c, d]) => vec![
            [[*a, *c], [*a, *d], [*b, *d]],
            [[*a, *c], [*b, *d], [*b, *c]],
        ],
        _ => Vec::new(),
    };

    let mut case = TetCase::default();
    for (slot, tri) in raw.into_iter().enumerate() {
        case.triangles[slot] = orient_outward(tri, &inside, &outside);
        case.count += 1;
    }
    case
}

/// Order the triangle so its normal points from the inside corners toward the
/// outside ones. Uses doubled edge midpoints to stay in integers.
fn orient_outward(tri: [CornerEdge; 3], inside: &[u8], outside: &[u8]) -> [CornerEdge; 3] {
    let mid = |e: CornerEdge| {
        let (p, q) = (corner_offset(e[0]), corner_offset(e[1]));
        [p[0] + q[0], p[1] + q[1], p[2] + q[2]]
    };
    let sum = |corners: &[u8]| {
        corners.iter().fold([0i32; 3], |acc, &c| {
            let o = corner_offset(c);
            [acc[0] + o[0], acc[1] + o[1], acc[2] + o[2]]
        })
    };

    let [m0, m1, m2] = tri.map(mid);
    let u = [m1[0] - m0[0], m1[1] - m0[1], m1[2] - m0[2]];
    let v = [m2[0] - m0[0], m2[1] - m0[1], m2[2] - m0[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];

    // mean(outside) - mean(inside), scaled by both counts
    let (si, so) = (sum(inside), sum(outside));
    let (ni, no) = (inside.len() as i32, outside.len() as i32);
    let dir = [
        so[0] * ni - si[0] * no,
        so[1] * ni - si[1] * no,
        so[2] * ni - si[2] * no,
    ];

    if n[0] * dir[0] + n[1] * dir[1] + n[2] * dir[2] < 0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}
