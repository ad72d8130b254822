use super::{BoundaryId, next_generation};
use crate::disc::basis::{ModalBasis, quadrilateral::QuadrilateralBasis, triangle::TriangleBasis};
use hashbrown::HashMap;
use nalgebra::Matrix2;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
}
#[derive(Clone, Debug)]
pub struct Edge {
    pub inodes: [usize; 2],
    pub parents: Vec<usize>,
    pub boundary_id: Option<BoundaryId>,
}
impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.parents.len() == 1
    }
}
pub trait Element2d: Clone + std::fmt::Debug {
    type Basis: ModalBasis;
    const NODE_NUM: usize;
    const NEEDS_CENTER_NODE: bool;
    fn from_inodes(inodes: &[usize]) -> Self;
    fn inodes(&self) -> &[usize];
    fn iedges(&self) -> &[usize];
    fn iedges_mut(&mut self) -> &mut [usize];
    /// Local vertices of local edge `local_edge`, counterclockwise.
    fn edge_vertices(local_edge: usize) -> [usize; 2] {
        [local_edge, (local_edge + 1) % Self::NODE_NUM]
    }
    fn map_to_physical(xi: f64, eta: f64, x: &[f64], y: &[f64]) -> [f64; 2];
    /// Jacobian `[[dx/dxi, dx/deta], [dy/dxi, dy/deta]]`.
    fn evaluate_jacob(xi: f64, eta: f64, x: &[f64], y: &[f64]) -> Matrix2<f64>;
    fn project_to_unit_cell(p: [f64; 2]) -> [f64; 2];
    /// Children of uniform refinement. `edge_midpoints[k]` is the node in the
    /// middle of local edge `k`.
    fn subdivide(&self, edge_midpoints: &[usize], center: Option<usize>) -> Vec<Self>;
}
#[derive(Clone, Debug)]
pub struct QuadrilateralElement {
    pub inodes: [usize; 4],
    pub iedges: [usize; 4],
}
impl Element2d for QuadrilateralElement {
    type Basis = QuadrilateralBasis;
    const NODE_NUM: usize = 4;
    const NEEDS_CENTER_NODE: bool = true;
    fn from_inodes(inodes: &[usize]) -> Self {
        Self {
            inodes: [inodes[0], inodes[1], inodes[2], inodes[3]],
            iedges: [0; 4],
        }
    }
    fn inodes(&self) -> &[usize] {
        &self.inodes
    }
    fn iedges(&self) -> &[usize] {
        &self.iedges
    }
    fn iedges_mut(&mut self) -> &mut [usize] {
        &mut self.iedges
    }
    fn map_to_physical(xi: f64, eta: f64, x: &[f64], y: &[f64]) -> [f64; 2] {
        let n = [
            0.25 * (1.0 - xi) * (1.0 - eta),
            0.25 * (1.0 + xi) * (1.0 - eta),
            0.25 * (1.0 + xi) * (1.0 + eta),
            0.25 * (1.0 - xi) * (1.0 + eta),
        ];
        let mut p = [0.0; 2];
        for k in 0..4 {
            p[0] += n[k] * x[k];
            p[1] += n[k] * y[k];
        }
        p
    }
    fn evaluate_jacob(xi: f64, eta: f64, x: &[f64], y: &[f64]) -> Matrix2<f64> {
        let dn_dxi = [
            -0.25 * (1.0 - eta), // dN1/dξ
            0.25 * (1.0 - eta),  // dN2/dξ
            0.25 * (1.0 + eta),  // dN3/dξ
            -0.25 * (1.0 + eta), // dN4/dξ
        ];
        let dn_deta = [
            -0.25 * (1.0 - xi), // dN1/dη
            -0.25 * (1.0 + xi), // dN2/dη
            0.25 * (1.0 + xi),  // dN3/dη
            0.25 * (1.0 - xi),  // dN4/dη
        ];
        let mut dx_dxi = 0.0;
        let mut dx_deta = 0.0;
        let mut dy_dxi = 0.0;
        let mut dy_deta = 0.0;
        for k in 0..4 {
            dx_dxi += dn_dxi[k] * x[k];
            dx_deta += dn_deta[k] * x[k];
            dy_dxi += dn_dxi[k] * y[k];
            dy_deta += dn_deta[k] * y[k];
        }
        Matrix2::new(dx_dxi, dx_deta, dy_dxi, dy_deta)
    }
    fn project_to_unit_cell(p: [f64; 2]) -> [f64; 2] {
        [p[0].clamp(-1.0, 1.0), p[1].clamp(-1.0, 1.0)]
    }
    fn subdivide(&self, edge_midpoints: &[usize], center: Option<usize>) -> Vec<Self> {
        let [v0, v1, v2, v3] = self.inodes;
        let [m0, m1, m2, m3] = [
            edge_midpoints[0],
            edge_midpoints[1],
            edge_midpoints[2],
            edge_midpoints[3],
        ];
        let c = center.unwrap_or_default();
        vec![
            Self::from_inodes(&[v0, m0, c, m3]),
            Self::from_inodes(&[m0, v1, m1, c]),
            Self::from_inodes(&[c, m1, v2, m2]),
            Self::from_inodes(&[m3, c, m2, v3]),
        ]
    }
}
#[derive(Clone, Debug)]
pub struct TriangleElement {
    pub inodes: [usize; 3],
    pub iedges: [usize; 3],
}
impl Element2d for TriangleElement {
    type Basis = TriangleBasis;
    const NODE_NUM: usize = 3;
    const NEEDS_CENTER_NODE: bool = false;
    fn from_inodes(inodes: &[usize]) -> Self {
        Self {
            inodes: [inodes[0], inodes[1], inodes[2]],
            iedges: [0; 3],
        }
    }
    fn inodes(&self) -> &[usize] {
        &self.inodes
    }
    fn iedges(&self) -> &[usize] {
        &self.iedges
    }
    fn iedges_mut(&mut self) -> &mut [usize] {
        &mut self.iedges
    }
    fn map_to_physical(xi: f64, eta: f64, x: &[f64], y: &[f64]) -> [f64; 2] {
        // N0 = -(xi + eta)/2, N1 = (1 + xi)/2, N2 = (1 + eta)/2
        let n = [-0.5 * (xi + eta), 0.5 * (1.0 + xi), 0.5 * (1.0 + eta)];
        [
            n[0] * x[0] + n[1] * x[1] + n[2] * x[2],
            n[0] * y[0] + n[1] * y[1] + n[2] * y[2],
        ]
    }
    fn evaluate_jacob(_xi: f64, _eta: f64, x: &[f64], y: &[f64]) -> Matrix2<f64> {
        let dn_dxi = [-0.5, 0.5, 0.0];
        let dn_deta = [-0.5, 0.0, 0.5];
        let mut dx_dxi = 0.0;
        let mut dx_deta = 0.0;
        let mut dy_dxi = 0.0;
        let mut dy_deta = 0.0;
        for k in 0..3 {
            dx_dxi += dn_dxi[k] * x[k];
            dx_deta += dn_deta[k] * x[k];
            dy_dxi += dn_dxi[k] * y[k];
            dy_deta += dn_deta[k] * y[k];
        }
        Matrix2::new(dx_dxi, dx_deta, dy_dxi, dy_deta)
    }
    fn project_to_unit_cell(p: [f64; 2]) -> [f64; 2] {
        let mut xi = p[0].max(-1.0);
        let mut eta = p[1].max(-1.0);
        let excess = xi + eta;
        if excess > 0.0 {
            xi -= 0.5 * excess;
            eta -= 0.5 * excess;
            if xi < -1.0 {
                eta += xi + 1.0;
                xi = -1.0;
            } else if eta < -1.0 {
                xi += eta + 1.0;
                eta = -1.0;
            }
        }
        [xi, eta]
    }
    fn subdivide(&self, edge_midpoints: &[usize], _center: Option<usize>) -> Vec<Self> {
        let [v0, v1, v2] = self.inodes;
        let [m0, m1, m2] = [edge_midpoints[0], edge_midpoints[1], edge_midpoints[2]];
        vec![
            Self::from_inodes(&[v0, m0, m2]),
            Self::from_inodes(&[m0, v1, m1]),
            Self::from_inodes(&[m2, m1, v2]),
            Self::from_inodes(&[m0, m1, m2]),
        ]
    }
}
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}
#[derive(Clone, Debug)]
pub struct Mesh2d<T: Element2d> {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub elements: Vec<T>,
    /// Cells sharing each node.
    pub node_parents: Vec<Vec<usize>>,
    /// Rank owning each element.
    pub owners: Vec<usize>,
    pub n_ranks: usize,
    /// Process-unique id, replaced by every operation that changes cell
    /// indexing or ownership.
    pub generation: u64,
    pub elem_num: usize,
    pub node_num: usize,
}
impl<T: Element2d> Mesh2d<T> {
    /// Builds edges and node-to-cell adjacency from counterclockwise
    /// elements. `boundary_id` classifies boundary edges by their nodes.
    pub fn from_elements<F>(nodes: Vec<Node>, mut elements: Vec<T>, boundary_id: F) -> Self
    where
        F: Fn(usize, usize, &[Node]) -> BoundaryId,
    {
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut node_parents = vec![Vec::new(); nodes.len()];
        for (ielem, elem) in elements.iter_mut().enumerate() {
            for local_edge in 0..T::NODE_NUM {
                let [a, b] = T::edge_vertices(local_edge);
                let (na, nb) = (elem.inodes()[a], elem.inodes()[b]);
                let iedge = *edge_map.entry(edge_key(na, nb)).or_insert_with(|| {
                    edges.push(Edge {
                        inodes: [na, nb],
                        parents: vec![],
                        boundary_id: None,
                    });
                    edges.len() - 1
                });
                edges[iedge].parents.push(ielem);
                elem.iedges_mut()[local_edge] = iedge;
            }
            for &inode in elem.inodes() {
                node_parents[inode].push(ielem);
            }
        }
        for edge in edges.iter_mut() {
            if edge.is_boundary() {
                edge.boundary_id = Some(boundary_id(edge.inodes[0], edge.inodes[1], &nodes));
            }
        }
        let elem_num = elements.len();
        let node_num = nodes.len();
        Self {
            nodes,
            edges,
            elements,
            node_parents,
            owners: vec![0; elem_num],
            n_ranks: 1,
            generation: next_generation(),
            elem_num,
            node_num,
        }
    }
    /// Contiguous blocks of cells per rank.
    pub fn partition(&mut self, n_ranks: usize) {
        self.assign_owners(n_ranks);
        self.generation = next_generation();
    }
    fn assign_owners(&mut self, n_ranks: usize) {
        let n_ranks = n_ranks.max(1);
        self.n_ranks = n_ranks;
        let elem_num = self.elem_num.max(1);
        self.owners = (0..self.elem_num)
            .map(|ielem| ielem * n_ranks / elem_num)
            .collect();
    }
    /// Splits every cell into four. Boundary ids and ownership layout carry
    /// over; cell indices do not, so the refined mesh gets a new generation.
    pub fn refine_uniform(&self) -> Self {
        let mut nodes = self.nodes.clone();
        let mut midpoints = vec![0; self.edges.len()];
        let mut child_boundary_ids: HashMap<(usize, usize), BoundaryId> = HashMap::new();
        for (iedge, edge) in self.edges.iter().enumerate() {
            let [a, b] = edge.inodes;
            nodes.push(Node {
                x: 0.5 * (self.nodes[a].x + self.nodes[b].x),
                y: 0.5 * (self.nodes[a].y + self.nodes[b].y),
            });
            let m = nodes.len() - 1;
            midpoints[iedge] = m;
            if let Some(id) = edge.boundary_id {
                child_boundary_ids.insert(edge_key(a, m), id);
                child_boundary_ids.insert(edge_key(m, b), id);
            }
        }
        let mut elements = Vec::with_capacity(4 * self.elem_num);
        for (ielem, elem) in self.elements.iter().enumerate() {
            let mids: SmallVec<[usize; 4]> = elem.iedges().iter().map(|&e| midpoints[e]).collect();
            let center = if T::NEEDS_CENTER_NODE {
                let [x, y] = self.element_center(ielem);
                nodes.push(Node { x, y });
                Some(nodes.len() - 1)
            } else {
                None
            };
            elements.extend(elem.subdivide(&mids, center));
        }
        let mut mesh = Self::from_elements(nodes, elements, |a, b, _| {
            child_boundary_ids
                .get(&edge_key(a, b))
                .copied()
                .unwrap_or_default()
        });
        mesh.assign_owners(self.n_ranks);
        mesh
    }
    pub fn cells_adjacent_to_vertex(&self, inode: usize) -> &[usize] {
        &self.node_parents[inode]
    }
    pub fn element_coords(&self, ielem: usize) -> (SmallVec<[f64; 4]>, SmallVec<[f64; 4]>) {
        let inodes = self.elements[ielem].inodes();
        (
            inodes.iter().map(|&i| self.nodes[i].x).collect(),
            inodes.iter().map(|&i| self.nodes[i].y).collect(),
        )
    }
    /// Vertex average of the cell.
    pub fn element_center(&self, ielem: usize) -> [f64; 2] {
        let inodes = self.elements[ielem].inodes();
        let n = inodes.len() as f64;
        let (sx, sy) = inodes.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + self.nodes[i].x, sy + self.nodes[i].y)
        });
        [sx / n, sy / n]
    }
    pub fn locally_owned_elements(&self, rank: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.elem_num).filter(move |&ielem| self.owners[ielem] == rank)
    }
}
/// Colorized boundary ids of an axis-aligned rectangle: x-min 0, x-max 1,
/// y-min 2, y-max 3.
fn rectangle_boundary_id(
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
) -> impl Fn(usize, usize, &[Node]) -> BoundaryId {
    let tol = 1e-10 * (x1 - x0).abs().max((y1 - y0).abs());
    move |a, b, nodes| {
        let mx = 0.5 * (nodes[a].x + nodes[b].x);
        let my = 0.5 * (nodes[a].y + nodes[b].y);
        if (mx - x0).abs() < tol {
            0
        } else if (mx - x1).abs() < tol {
            1
        } else if (my - y0).abs() < tol {
            2
        } else {
            3
        }
    }
}
fn rectangle_nodes(x_num: usize, y_num: usize, x0: f64, x1: f64, y0: f64, y1: f64) -> Vec<Node> {
    let mut nodes = Vec::with_capacity((x_num + 1) * (y_num + 1));
    for j in 0..=y_num {
        for i in 0..=x_num {
            nodes.push(Node {
                x: x0 + (x1 - x0) * i as f64 / x_num as f64,
                y: y0 + (y1 - y0) * j as f64 / y_num as f64,
            });
        }
    }
    nodes
}
impl Mesh2d<QuadrilateralElement> {
    pub fn create_quad_mesh(
        x_num: usize,
        y_num: usize,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
    ) -> Mesh2d<QuadrilateralElement> {
        let nodes = rectangle_nodes(x_num, y_num, x0, x1, y0, y1);
        let mut elements = Vec::with_capacity(x_num * y_num);
        for j in 0..y_num {
            for i in 0..x_num {
                let n00 = j * (x_num + 1) + i;
                let n10 = n00 + 1;
                let n01 = n00 + x_num + 1;
                let n11 = n01 + 1;
                elements.push(QuadrilateralElement::from_inodes(&[n00, n10, n11, n01]));
            }
        }
        Self::from_elements(nodes, elements, rectangle_boundary_id(x0, x1, y0, y1))
    }
}
impl Mesh2d<TriangleElement> {
    /// Each rectangle of the structured grid is cut along its rising diagonal.
    pub fn create_tri_mesh(
        x_num: usize,
        y_num: usize,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
    ) -> Mesh2d<TriangleElement> {
        let nodes = rectangle_nodes(x_num, y_num, x0, x1, y0, y1);
        let mut elements = Vec::with_capacity(2 * x_num * y_num);
        for j in 0..y_num {
            for i in 0..x_num {
                let n00 = j * (x_num + 1) + i;
                let n10 = n00 + 1;
                let n01 = n00 + x_num + 1;
                let n11 = n01 + 1;
                elements.push(TriangleElement::from_inodes(&[n00, n10, n11]));
                elements.push(TriangleElement::from_inodes(&[n00, n11, n01]));
            }
        }
        Self::from_elements(nodes, elements, rectangle_boundary_id(x0, x1, y0, y1))
    }
}
