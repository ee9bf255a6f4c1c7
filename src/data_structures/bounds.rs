use cgmath::{Point3, Vector3};

/// Axis-aligned bounding box in model space.
///
/// An empty box has `min > max`. Its centre is the origin, matching how the
/// layout treats models without geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn extend(&mut self, point: Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut merged = *self;
        if !other.is_empty() {
            merged.extend(other.min);
            merged.extend(other.max);
        }
        merged
    }

    pub fn center(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        Vector3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Point3<f32>> for Aabb {
    fn from_iter<I: IntoIterator<Item = Point3<f32>>>(iter: I) -> Self {
        let mut aabb = Aabb::empty();
        iter.into_iter().for_each(|p| aabb.extend(p));
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_is_centred_at_origin() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
        assert_eq!(aabb.center(), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn centre_of_extended_box() {
        let aabb: Aabb = [Point3::new(-1.0, 2.0, 0.0), Point3::new(3.0, 6.0, 4.0)]
            .into_iter()
            .collect();
        assert_eq!(aabb.center(), Vector3::new(1.0, 4.0, 2.0));
    }

    #[test]
    fn union_ignores_empty_side() {
        let aabb: Aabb = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0)]
            .into_iter()
            .collect();
        assert_eq!(aabb.union(&Aabb::empty()), aabb);
        assert_eq!(Aabb::empty().union(&aabb), aabb);
    }
}
