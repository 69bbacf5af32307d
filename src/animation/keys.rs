// src/animation/keys.rs
use crate::animation::values::{Interpolatable, interpolate_rotation_key};
use crate::errors::{AnimationError, Result, try_filled_vec};

/// Number of candidate intervals probed around the cursor before falling
/// back to a binary search.
const SCAN_WINDOW: usize = 4;

const MIN_CAPACITY: usize = 4;

type Blend<const D: usize> = fn(&[f32; D], &[f32; D], f32) -> [f32; D];

/// Cached search position into a key array.
///
/// Cursors are owned by whoever drives playback, not by the key array, so a
/// single shared array can be sampled by many independent players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCursor {
    pub last_index: usize,
}

/// A timestamped `D`-dimensional sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key<const D: usize> {
    pub time: f32,
    pub value: [f32; D],
}

/// Growable array of `(time, [f32; D])` keys.
///
/// Times and values are stored as parallel arrays. Keys may be appended in
/// any order; call [`sort_keys`](Self::sort_keys) before searching if they
/// were not appended in ascending time.
#[derive(Debug, Clone, Default)]
pub struct AnimationKeyArray<const D: usize> {
    times: Vec<f32>,
    values: Vec<[f32; D]>,
}

impl<const D: usize> AnimationKeyArray<D> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut keys = Self::new();
        keys.reserve_exact(capacity)?;
        Ok(keys)
    }

    /// Builds a sorted array from `(time, value)` pairs.
    pub fn from_keys(keys: impl IntoIterator<Item = (f32, [f32; D])>) -> Result<Self> {
        let mut array = Self::new();
        for (time, value) in keys {
            array.push_key(time, value)?;
        }
        array.sort_keys()?;
        Ok(array)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.times.capacity().min(self.values.capacity())
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[[f32; D]] {
        &self.values
    }

    /// Appends a zero-initialized key and returns its index.
    ///
    /// When full, capacity grows by half of its current size (at least 4 slots).
    pub fn add_key(&mut self) -> Result<usize> {
        if self.len() == self.capacity() {
            let current = self.capacity();
            let grown = (current + current / 2).max(MIN_CAPACITY);
            self.reserve_exact(grown - self.len())?;
        }
        self.times.push(0.0);
        self.values.push([0.0; D]);
        Ok(self.times.len() - 1)
    }

    /// Appends a key with the given time and value and returns its index.
    pub fn push_key(&mut self, time: f32, value: [f32; D]) -> Result<usize> {
        let index = self.add_key()?;
        self.set_key_time(index, time)?;
        self.set_key_value(index, value)?;
        Ok(index)
    }

    pub fn set_key_time(&mut self, index: usize, time: f32) -> Result<()> {
        if time < 0.0 {
            return Err(AnimationError::NegativeKeyTime { time });
        }
        let len = self.len();
        let slot = self
            .times
            .get_mut(index)
            .ok_or(AnimationError::KeyIndexOutOfRange { index, len })?;
        *slot = time;
        Ok(())
    }

    pub fn set_key_value(&mut self, index: usize, value: [f32; D]) -> Result<()> {
        let len = self.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(AnimationError::KeyIndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    pub fn key_time(&self, index: usize) -> Result<f32> {
        self.times
            .get(index)
            .copied()
            .ok_or(AnimationError::KeyIndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn key_value(&self, index: usize) -> Result<[f32; D]> {
        self.values
            .get(index)
            .copied()
            .ok_or(AnimationError::KeyIndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn key(&self, index: usize) -> Result<Key<D>> {
        Ok(Key {
            time: self.key_time(index)?,
            value: self.key_value(index)?,
        })
    }

    /// Stable sort by ascending time.
    ///
    /// Sorting needs scratch storage the size of the array; on allocation
    /// failure the keys are left in their original order.
    pub fn sort_keys(&mut self) -> Result<()> {
        if self.times.windows(2).all(|w| w[0] <= w[1]) {
            return Ok(());
        }

        let len = self.len();
        let mut order = try_filled_vec(len, 0_usize, "key sort order")?;
        let mut times = try_filled_vec(len, 0.0_f32, "sorted key times")?;
        let mut values = try_filled_vec(len, [0.0_f32; D], "sorted key values")?;

        for (i, slot) in order.iter_mut().enumerate() {
            *slot = i;
        }
        // Index tie-break keeps equal times in insertion order
        order.sort_unstable_by(|&a, &b| self.times[a].total_cmp(&self.times[b]).then(a.cmp(&b)));

        for ((&source, time), value) in order.iter().zip(&mut times).zip(&mut values) {
            *time = self.times[source];
            *value = self.values[source];
        }
        self.times = times;
        self.values = values;
        Ok(())
    }

    /// Finds the index `i` of the key whose interval `[time(i), time(i+1))`
    /// contains `time`.
    ///
    /// The last key owns `[time(last), ∞)`. Times before the first key resolve
    /// to index 0. Up to four intervals are probed starting at `hint`, walking
    /// forward or backward with wraparound, before a binary search over the
    /// whole array.
    pub fn find_key(&self, time: f32, hint: usize, forward: bool) -> Result<usize> {
        let len = self.len();
        if len == 0 {
            return Err(AnimationError::EmptyKeyArray);
        }
        if time < 0.0 {
            return Err(AnimationError::NegativeKeyTime { time });
        }
        if hint >= len {
            return Err(AnimationError::HintOutOfRange { hint, len });
        }

        // Fast path: probe the neighbourhood of the previous hit
        let mut index = hint;
        for _ in 0..SCAN_WINDOW.min(len) {
            if self.interval_contains(index, time) {
                return Ok(index);
            }
            index = if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            };
        }

        // Large jump: upper-bound binary search
        let next = self.times.partition_point(|&t| t <= time);
        Ok(next.saturating_sub(1))
    }

    #[inline]
    fn interval_contains(&self, index: usize, time: f32) -> bool {
        let last = self.times.len() - 1;
        if index == last {
            time >= self.times[last]
        } else {
            self.times[index] <= time && time < self.times[index + 1]
        }
    }

    fn find_with_cursor(
        &self,
        time: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<usize> {
        match cursor {
            Some(cursor) => {
                let index = self.find_key(time, cursor.last_index, forward)?;
                cursor.last_index = index;
                Ok(index)
            }
            None => self.find_key(time, 0, forward),
        }
    }

    /// Samples the array at `time`, clamping outside the keyed range.
    pub fn sample(
        &self,
        time: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<[f32; D]> {
        self.sample_by(time, cursor, forward, <[f32; D]>::interpolate_linear)
    }

    /// Samples the array as a periodic signal with period `duration`.
    ///
    /// Outside the keyed range the value blends from the last key back into
    /// the first one, as if the keys repeated every `duration` seconds.
    pub fn sample_looping(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<[f32; D]> {
        self.sample_looping_by(time, duration, cursor, forward, <[f32; D]>::interpolate_linear)
    }

    fn sample_by(
        &self,
        time: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
        blend: Blend<D>,
    ) -> Result<[f32; D]> {
        let index = self.find_with_cursor(time, cursor, forward)?;
        let last = self.len() - 1;

        if index == last || time < self.times[index] {
            return Ok(self.values[index]);
        }

        let t0 = self.times[index];
        let t1 = self.times[index + 1];
        let dt = t1 - t0;
        if dt <= 0.0 {
            return Ok(self.values[index]);
        }

        let frac = ((time - t0) / dt).clamp(0.0, 1.0);
        Ok(blend(&self.values[index], &self.values[index + 1], frac))
    }

    fn sample_looping_by(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
        blend: Blend<D>,
    ) -> Result<[f32; D]> {
        if duration <= 0.0 {
            return self.sample_by(time.max(0.0), cursor, forward, blend);
        }

        let mut time = time.rem_euclid(duration);
        if time >= duration {
            time = 0.0;
        }

        let index = self.find_with_cursor(time, cursor, forward)?;
        let len = self.len();
        if len == 1 {
            return Ok(self.values[0]);
        }
        let last = len - 1;

        let first_time = self.times[0];
        let last_time = self.times[last];

        let (t0, v0, t1, v1) = if time < first_time {
            (
                last_time - duration,
                &self.values[last],
                first_time,
                &self.values[0],
            )
        } else if index == last {
            (
                last_time,
                &self.values[last],
                first_time + duration,
                &self.values[0],
            )
        } else {
            (
                self.times[index],
                &self.values[index],
                self.times[index + 1],
                &self.values[index + 1],
            )
        };

        let dt = t1 - t0;
        if dt <= 0.0 {
            return Ok(*v0);
        }

        let frac = ((time - t0) / dt).clamp(0.0, 1.0);
        Ok(blend(v0, v1, frac))
    }

    fn reserve_exact(&mut self, additional: usize) -> Result<()> {
        let requested = self.len() + additional;
        let failed = |_| AnimationError::AllocationFailed {
            context: "animation keys",
            requested,
        };
        self.times.try_reserve_exact(additional).map_err(failed)?;
        self.values.try_reserve_exact(additional).map_err(failed)?;
        Ok(())
    }
}

impl AnimationKeyArray<4> {
    /// Like [`sample`](Self::sample), but treats values as `[x, y, z, w]`
    /// quaternions and blends along the shorter arc.
    pub fn sample_rotation(
        &self,
        time: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<[f32; 4]> {
        self.sample_by(time, cursor, forward, interpolate_rotation_key)
    }

    /// Looping counterpart of [`sample_rotation`](Self::sample_rotation).
    pub fn sample_rotation_looping(
        &self,
        time: f32,
        duration: f32,
        cursor: Option<&mut KeyCursor>,
        forward: bool,
    ) -> Result<[f32; 4]> {
        self.sample_looping_by(time, duration, cursor, forward, interpolate_rotation_key)
    }
}
