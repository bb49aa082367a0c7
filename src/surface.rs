//! Target-keyed ownership of the drawing surface.
//!
//! The surface bundle (context, render target, drawable) is created and
//! released as one value through a [`SurfaceFactory`], so no part of it can
//! outlive the others.

/// What a surface is built for. Two keys that differ need two surfaces.
pub trait SurfaceKey: Copy + PartialEq {
    /// Pixel size of the target.
    fn size(&self) -> [u32; 2];

    /// Whether the target has no pixels to draw into.
    fn is_empty(&self) -> bool {
        self.size().contains(&0)
    }
}

impl SurfaceKey for [u32; 2] {
    fn size(&self) -> [u32; 2] {
        *self
    }
}

/// Creates and destroys surface bundles.
pub trait SurfaceFactory {
    /// The bundle type.
    type Surface;
    /// Identifies the target a bundle draws into.
    type Key: SurfaceKey;
    /// Creation failure.
    type Error;

    /// Build a bundle for `key`. Never called with an empty key.
    ///
    /// # Errors
    ///
    /// Implementation-defined; nothing is retained on failure.
    fn create(&mut self, key: Self::Key) -> Result<Self::Surface, Self::Error>;

    /// Free every resource held by `surface`.
    fn release(&mut self, surface: Self::Surface);
}

/// Holds at most one surface, matching the most recently requested key.
#[derive(Debug)]
pub struct SurfaceSlot<S, K> {
    current: Option<(S, K)>,
    generation: u64,
}

impl<S, K> Default for SurfaceSlot<S, K> {
    fn default() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }
}

impl<S, K: SurfaceKey> SurfaceSlot<S, K> {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the surface for `key`, replacing the held one if it was built
    /// for a different key.
    ///
    /// An empty key yields `Ok(None)` and leaves the held surface alone, so a
    /// minimized window keeps its surface for when it comes back.
    ///
    /// # Errors
    ///
    /// Propagates the factory's creation error. The slot is empty afterwards.
    pub fn ensure<F>(&mut self, factory: &mut F, key: K) -> Result<Option<&mut S>, F::Error>
    where
        F: SurfaceFactory<Surface = S, Key = K>,
    {
        if key.is_empty() {
            return Ok(None);
        }

        let stale = self
            .current
            .as_ref()
            .is_some_and(|(_, current)| *current != key);
        if stale {
            let [width, height] = key.size();
            log::debug!("render target changed ({width}x{height}), rebuilding surface");
            self.release(factory);
        }

        let (surface, _) = match self.current.take() {
            Some(held) => self.current.insert(held),
            None => {
                let surface = factory.create(key)?;
                self.generation += 1;
                self.current.insert((surface, key))
            }
        };
        Ok(Some(surface))
    }

    /// Release the held surface, if any.
    pub fn release<F>(&mut self, factory: &mut F)
    where
        F: SurfaceFactory<Surface = S, Key = K>,
    {
        if let Some((surface, _)) = self.current.take() {
            factory.release(surface);
        }
    }

    /// The held surface.
    #[must_use]
    pub fn get(&self) -> Option<&S> {
        self.current.as_ref().map(|(surface, _)| surface)
    }

    /// Key of the held surface.
    #[must_use]
    pub fn key(&self) -> Option<K> {
        self.current.as_ref().map(|(_, key)| *key)
    }

    /// Number of surfaces created over the slot's lifetime.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
