use tessera_geom::{Plane, Vec3};

use crate::mesh_build::PreMeshBuffer;

// Vertices closer than this to a splitting plane count as lying on it.
const PLANE_EPSILON: f32 = 1e-3;

/// One translucent triangle of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTriangle {
    /// Buffer the triangle's indices live in.
    pub buffer: usize,
    pub indices: [u16; 3],
    pub vertices: [Vec3; 3],
    pub centroid: Vec3,
}

impl MeshTriangle {
    fn plane(&self) -> Plane {
        let [a, b, c] = self.vertices;
        Plane::from_triangle(a, b, c).unwrap_or(Plane {
            normal: Vec3::UP,
            origin: self.centroid,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BspNode {
    pub plane: Plane,
    /// Triangles lying in `plane`, in insertion order.
    pub coplanar: Vec<u32>,
    pub front: Option<usize>,
    pub back: Option<usize>,
}

#[derive(Clone, Copy)]
enum Side {
    Coplanar,
    Front,
    Back,
}

#[derive(Clone, Copy)]
enum Link {
    Root,
    Front(usize),
    Back(usize),
}

enum Visit {
    Node(usize),
    Emit(usize, bool),
}

/// Binary space partition over a mesh's translucent triangles, giving a
/// back-to-front draw order for any viewpoint.
#[derive(Clone, Debug, Default)]
pub struct TransparencySorter {
    triangles: Vec<MeshTriangle>,
    nodes: Vec<BspNode>,
    root: Option<usize>,
}

impl TransparencySorter {
    /// Collects the triangles of every blended buffer and partitions them.
    pub fn build(buffers: &[PreMeshBuffer]) -> Self {
        let mut triangles = Vec::new();
        for (bi, buf) in buffers.iter().enumerate() {
            if !buf.is_translucent() {
                continue;
            }
            for tri in buf.indices.chunks_exact(3) {
                let indices = [tri[0], tri[1], tri[2]];
                let vertices = indices.map(|i| buf.vertices[usize::from(i)].pos);
                let centroid = (vertices[0] + vertices[1] + vertices[2]) / 3.0;
                triangles.push(MeshTriangle {
                    buffer: bi,
                    indices,
                    vertices,
                    centroid,
                });
            }
        }
        let mut sorter = Self {
            triangles,
            nodes: Vec::new(),
            root: None,
        };
        sorter.partition();
        sorter
    }

    fn partition(&mut self) {
        let all: Vec<u32> = (0..self.triangles.len() as u32).collect();
        let mut pending = vec![(all, Link::Root)];
        while let Some((set, link)) = pending.pop() {
            let Some((&first, rest)) = set.split_first() else {
                continue;
            };
            let plane = self.triangles[first as usize].plane();
            let mut coplanar = vec![first];
            let mut front = Vec::new();
            let mut back = Vec::new();
            for &t in rest {
                match self.classify(&self.triangles[t as usize], &plane) {
                    Side::Coplanar => coplanar.push(t),
                    Side::Front => front.push(t),
                    Side::Back => back.push(t),
                }
            }
            let id = self.nodes.len();
            self.nodes.push(BspNode {
                plane,
                coplanar,
                front: None,
                back: None,
            });
            match link {
                Link::Root => self.root = Some(id),
                Link::Front(parent) => self.nodes[parent].front = Some(id),
                Link::Back(parent) => self.nodes[parent].back = Some(id),
            }
            if !front.is_empty() {
                pending.push((front, Link::Front(id)));
            }
            if !back.is_empty() {
                pending.push((back, Link::Back(id)));
            }
        }
    }

    fn classify(&self, t: &MeshTriangle, plane: &Plane) -> Side {
        let d = t.vertices.map(|v| plane.signed_distance(v));
        if d.iter().all(|x| x.abs() <= PLANE_EPSILON) {
            Side::Coplanar
        } else if d.iter().all(|x| *x >= -PLANE_EPSILON) {
            Side::Front
        } else if d.iter().all(|x| *x <= PLANE_EPSILON) {
            Side::Back
        } else if plane.signed_distance(t.centroid) >= 0.0 {
            // Straddlers are not split.
            Side::Front
        } else {
            Side::Back
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn triangles(&self) -> &[MeshTriangle] {
        &self.triangles
    }

    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Triangle indices, farthest first, as seen from `viewpoint`.
    pub fn order(&self, viewpoint: Vec3) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.triangles.len());
        let mut stack: Vec<Visit> = self.root.map(Visit::Node).into_iter().collect();
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Node(i) => {
                    let node = &self.nodes[i];
                    let in_front = node.plane.signed_distance(viewpoint) >= 0.0;
                    let (far, near) = if in_front {
                        (node.back, node.front)
                    } else {
                        (node.front, node.back)
                    };
                    stack.extend(near.map(Visit::Node));
                    stack.push(Visit::Emit(i, !in_front));
                    stack.extend(far.map(Visit::Node));
                }
                Visit::Emit(i, reversed) => {
                    let tris = &self.nodes[i].coplanar;
                    if reversed {
                        out.extend(tris.iter().rev());
                    } else {
                        out.extend(tris.iter());
                    }
                }
            }
        }
        out
    }

    /// Rewrites each translucent buffer's index list to follow `order`.
    pub fn apply_order(&self, order: &[u32], buffers: &mut [PreMeshBuffer]) {
        let mut touched = vec![false; buffers.len()];
        for t in &self.triangles {
            if let Some(slot) = touched.get_mut(t.buffer) {
                *slot = true;
            }
        }
        for (buf, touched) in buffers.iter_mut().zip(&touched) {
            if *touched {
                buf.indices.clear();
            }
        }
        for &t in order {
            let Some(tri) = self.triangles.get(t as usize) else {
                continue;
            };
            if let Some(buf) = buffers.get_mut(tri.buffer) {
                buf.indices.extend_from_slice(&tri.indices);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_build::{TileKey, Vertex};
    use tessera_blocks::{BlendMode, LayerId};

    fn buffer(quads: &[f32]) -> PreMeshBuffer {
        let mut buf = PreMeshBuffer::new(TileKey {
            layer: LayerId(1),
            blend: BlendMode::Blend,
            crack: false,
            backface_culling: false,
        });
        // Unit quads in the plane z = `z`.
        for &z in quads {
            let base = buf.vertices.len() as u16;
            for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                buf.vertices.push(Vertex {
                    pos: Vec3::new(x, y, z),
                    ..Vertex::default()
                });
            }
            buf.indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
        }
        buf
    }

    fn layer_of(sorter: &TransparencySorter, order: &[u32]) -> Vec<f32> {
        order
            .iter()
            .map(|&t| sorter.triangles()[t as usize].centroid.z)
            .collect()
    }

    #[test]
    fn draws_far_layers_first() {
        let buffers = vec![buffer(&[0.0, 2.0, 1.0])];
        let sorter = TransparencySorter::build(&buffers);
        assert_eq!(sorter.triangles().len(), 6);
        let order = sorter.order(Vec3::new(0.5, 0.5, 10.0));
        assert_eq!(layer_of(&sorter, &order), vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        let order = sorter.order(Vec3::new(0.5, 0.5, -10.0));
        assert_eq!(layer_of(&sorter, &order), vec![2.0, 2.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn opposite_viewpoints_reverse_the_order() {
        let buffers = vec![buffer(&[0.0, 3.0, -1.0, 1.5])];
        let sorter = TransparencySorter::build(&buffers);
        let a = sorter.order(Vec3::new(0.3, 0.2, 20.0));
        let mut b = sorter.order(Vec3::new(0.3, 0.2, -20.0));
        b.reverse();
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn opaque_buffers_are_ignored_and_kept() {
        let mut opaque = buffer(&[0.0]);
        opaque.key.blend = BlendMode::Opaque;
        let mut buffers = vec![opaque.clone(), buffer(&[0.0, 1.0])];
        let sorter = TransparencySorter::build(&buffers);
        assert!(sorter.triangles().iter().all(|t| t.buffer == 1));
        let order = sorter.order(Vec3::new(0.5, 0.5, -5.0));
        sorter.apply_order(&order, &mut buffers);
        assert_eq!(buffers[0].indices, opaque.indices);
        // Quad at z = 1 is now drawn first, its coplanar pair reversed
        assert_eq!(&buffers[1].indices[..6], &[6, 7, 4, 4, 5, 6]);
        assert_eq!(buffers[1].indices.len(), 12);
    }
}
