use crate::world::replicate::Replicate;

/// Read access to a scene graph. `E` is the caller's own handle type.
pub trait SceneRef<E> {
    /// The scene root, always present
    fn root(&self) -> E;

    fn has_object(&self, handle: &E) -> bool;

    fn object(&self, handle: &E) -> Option<&dyn Replicate>;

    /// Structural parent of a node, `None` for the root & for detached nodes
    fn parent(&self, handle: &E) -> Option<E>;

    /// Child nodes, in the scene's own order
    fn children(&self, handle: &E) -> Vec<E>;

    /// Attributes owned by this node
    fn attributes(&self, handle: &E) -> Vec<E>;
}

/// Mutable access to a scene graph, used to register objects on the publisher
/// and to build the mirror on the subscriber
pub trait SceneMut<E>: SceneRef<E> {
    fn object_mut(&mut self, handle: &E) -> Option<&mut dyn Replicate>;

    /// Insert a new, unattached object
    fn spawn_object(&mut self, object: Box<dyn Replicate>) -> E;

    /// Remove an object and every link to or from it
    fn despawn_object(&mut self, handle: &E) -> Option<Box<dyn Replicate>>;

    /// Attach `child` under `parent`. Callers detach it from any previous parent first.
    fn add_child(&mut self, parent: &E, child: &E);

    fn remove_child(&mut self, parent: &E, child: &E);

    fn add_attribute(&mut self, owner: &E, attribute: &E);

    fn remove_attribute(&mut self, owner: &E, attribute: &E);
}
