//! Lazily discovered joint hierarchy.
//!
//! The shape format names bones only by a byte ID inside weighted vertices.
//! Joints are created the first time an ID shows up and hang off a single
//! root, which always stands for bone 0.

use indexmap::IndexMap;

/// Index of a joint inside a [`Skeleton`].
pub type JointId = usize;

/// Name given to the root joint.
pub const ROOT_JOINT_NAME: &str = "Root";

/// Prefix for joints synthesized from bone IDs.
pub const AUTO_JOINT_PREFIX: &str = "AutoExporterJoint";

/// One node of the joint tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joint {
    pub name: String,
    pub children: Vec<JointId>,
}

/// Joint arena plus the insertion-ordered bone map.
#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    bones: IndexMap<u8, JointId>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Skeleton {
    /// The root joint's id.
    pub const ROOT: JointId = 0;

    /// Create a skeleton with bone 0 registered as the root.
    pub fn new() -> Self {
        let mut bones = IndexMap::new();
        bones.insert(0, Self::ROOT);
        Self {
            joints: vec![Joint {
                name: ROOT_JOINT_NAME.to_string(),
                children: Vec::new(),
            }],
            bones,
        }
    }

    /// Return the joint for `bone`, creating it under the root if needed.
    pub fn ensure_bone(&mut self, bone: u8) -> JointId {
        if let Some(&joint) = self.bones.get(&bone) {
            return joint;
        }

        let joint = self.joints.len();
        self.joints.push(Joint {
            name: format!("{AUTO_JOINT_PREFIX}{bone}"),
            children: Vec::new(),
        });
        self.joints[Self::ROOT].children.push(joint);
        self.bones.insert(bone, joint);
        joint
    }

    /// Position of `bone` in registration order.
    ///
    /// This is the joint index a skin controller uses for the bone.
    #[inline]
    pub fn bone_slot(&self, bone: u8) -> Option<usize> {
        self.bones.get_index_of(&bone)
    }

    /// Registered bones and their joints, in registration order.
    pub fn bones(&self) -> impl Iterator<Item = (u8, &Joint)> + '_ {
        self.bones
            .iter()
            .map(move |(&bone, &joint)| (bone, &self.joints[joint]))
    }

    /// Number of registered bones.
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Look up a joint.
    #[inline]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id)
    }

    /// Visit joints depth-first, parents before children.
    ///
    /// Yields `(depth, id)` pairs with the root at depth 0.
    pub fn depth_first(&self) -> Vec<(usize, JointId)> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut stack = vec![(0usize, Self::ROOT)];

        while let Some((depth, id)) = stack.pop() {
            order.push((depth, id));
            for &child in self.joints[id].children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_zero_is_root() {
        let mut skeleton = Skeleton::new();
        assert_eq!(skeleton.ensure_bone(0), Skeleton::ROOT);
        assert_eq!(skeleton.bone_slot(0), Some(0));
        assert_eq!(skeleton.bone_count(), 1);
        assert_eq!(skeleton.joint(Skeleton::ROOT).unwrap().name, "Root");
    }

    #[test]
    fn test_lazy_registration() {
        let mut skeleton = Skeleton::new();
        let a = skeleton.ensure_bone(7);
        let b = skeleton.ensure_bone(3);
        assert_eq!(skeleton.ensure_bone(7), a);

        assert_eq!(skeleton.bone_slot(7), Some(1));
        assert_eq!(skeleton.bone_slot(3), Some(2));
        assert_eq!(skeleton.bone_slot(9), None);

        let names: Vec<_> = skeleton.bones().map(|(_, j)| j.name.as_str()).collect();
        assert_eq!(names, ["Root", "AutoExporterJoint7", "AutoExporterJoint3"]);

        let root = skeleton.joint(Skeleton::ROOT).unwrap();
        assert_eq!(root.children, vec![a, b]);
    }

    #[test]
    fn test_depth_first_order() {
        let mut skeleton = Skeleton::new();
        skeleton.ensure_bone(5);
        skeleton.ensure_bone(2);

        let order = skeleton.depth_first();
        assert_eq!(order, vec![(0, 0), (1, 1), (1, 2)]);
    }
}
