use alloc::boxed::Box;
use core::alloc::Layout;
use core::fmt::Debug;

use crate::error::Error;

type Link = Option<Box<Node>>;

struct Node {
    key: i32,
    value: i32,
    next: Link,
}

impl Node {
    /// Allocates a detached node, reporting allocation failure instead of
    /// aborting.
    fn try_boxed(key: i32, value: i32) -> Result<Box<Node>, Error> {
        let layout = Layout::new::<Node>();

        // SAFETY: `Node` is not zero-sized, so `layout` has a non-zero size as
        // `alloc` requires. On success the pointer is valid for writes of one
        // `Node` and is allocated by the global allocator with the layout that
        // `Box<Node>` uses, so handing it to `Box::from_raw` after the write is
        // sound.
        unsafe {
            let raw = alloc::alloc::alloc(layout) as *mut Node;
            if raw.is_null() {
                log::warn!("entry allocation of {} bytes failed", layout.size());
                return Err(Error::AllocationFailure);
            }

            raw.write(Node {
                key,
                value,
                next: None,
            });
            Ok(Box::from_raw(raw))
        }
    }
}

/// A singly-linked chain of exclusively owned nodes, most recent first.
///
/// Teardown is iterative so arbitrarily long chains (every key colliding
/// into one bucket) never recurse through `Box` drops.
#[derive(Default)]
struct Chain {
    head: Link,
}

impl Chain {
    fn push_front(&mut self, key: i32, value: i32) -> Result<(), Error> {
        let mut node = Node::try_boxed(key, value)?;
        node.next = self.head.take();
        self.head = Some(node);
        Ok(())
    }

    fn pop_front(&mut self) -> Option<(i32, i32)> {
        self.head.take().map(|mut node| {
            self.head = node.next.take();
            (node.key, node.value)
        })
    }

    /// Unlinks and frees every node holding `key`, re-linking the survivors
    /// in their original order.
    fn remove_key(&mut self, key: i32) -> usize {
        let mut removed = 0;
        let mut rest = self.head.take();
        let mut tail = &mut self.head;

        while let Some(mut node) = rest {
            rest = node.next.take();
            if node.key == key {
                removed += 1;
            } else {
                tail = &mut tail.insert(node).next;
            }
        }

        removed
    }

    fn clear(&mut self) -> usize {
        let mut freed = 0;
        let mut rest = self.head.take();
        while let Some(mut node) = rest {
            rest = node.next.take();
            freed += 1;
        }
        freed
    }

    fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn iter(&self) -> Entries<'_> {
        Entries {
            inline: None,
            node: self.head.as_deref(),
        }
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Debug for Chain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the `(key, value)` pairs of one bucket, from the most
/// recently inserted entry to the oldest.
#[derive(Clone)]
pub struct Entries<'a> {
    inline: Option<(i32, i32)>,
    node: Option<&'a Node>,
}

impl Iterator for Entries<'_> {
    type Item = (i32, i32);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.inline.take() {
            return Some(entry);
        }

        let node = self.node?;
        self.node = node.next.as_deref();
        Some((node.key, node.value))
    }
}

impl core::iter::FusedIterator for Entries<'_> {}

mod private {
    pub trait Sealed {}
}

/// Storage for one bucket's chain.
///
/// Two representations are provided and behave identically from the
/// outside; they differ only in how many allocations a bucket costs.
/// This trait is sealed.
pub trait Bucket: private::Sealed + Default + Debug {
    /// Makes `(key, value)` the new head of the chain.
    ///
    /// On [`Error::AllocationFailure`] the chain is left untouched.
    fn push_front(&mut self, key: i32, value: i32) -> Result<(), Error>;

    /// Frees every entry holding `key` while preserving the relative order
    /// of the survivors. Returns the number of entries removed.
    fn remove_key(&mut self, key: i32) -> usize;

    /// Frees every entry. Returns the number of entries freed.
    fn clear(&mut self) -> usize;

    /// Iterates the chain from most recent to oldest.
    fn entries(&self) -> Entries<'_>;

    /// Returns `true` if the chain holds no entries.
    fn is_empty(&self) -> bool;

    /// Returns the chain length. Walks the whole chain.
    fn len(&self) -> usize {
        self.entries().count()
    }
}

/// A bucket whose entries all live in heap-allocated nodes.
#[derive(Debug, Default)]
pub struct LinkedBucket {
    chain: Chain,
}

impl private::Sealed for LinkedBucket {}

impl Bucket for LinkedBucket {
    #[inline]
    fn push_front(&mut self, key: i32, value: i32) -> Result<(), Error> {
        self.chain.push_front(key, value)
    }

    fn remove_key(&mut self, key: i32) -> usize {
        self.chain.remove_key(key)
    }

    fn clear(&mut self) -> usize {
        self.chain.clear()
    }

    #[inline]
    fn entries(&self) -> Entries<'_> {
        self.chain.iter()
    }

    fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// A bucket that stores its most recent entry inline and the rest in an
/// overflow chain, so a bucket holding a single entry costs no allocation.
///
/// Invariant: `overflow` is empty whenever `first` is `None`.
#[derive(Debug, Default)]
pub struct InlineBucket {
    first: Option<(i32, i32)>,
    overflow: Chain,
}

impl private::Sealed for InlineBucket {}

impl Bucket for InlineBucket {
    fn push_front(&mut self, key: i32, value: i32) -> Result<(), Error> {
        if let Some((old_key, old_value)) = self.first {
            // Demote the current head first; if that fails nothing has moved.
            self.overflow.push_front(old_key, old_value)?;
        }
        self.first = Some((key, value));
        Ok(())
    }

    fn remove_key(&mut self, key: i32) -> usize {
        let mut removed = self.overflow.remove_key(key);
        if self.first.is_some_and(|(head_key, _)| head_key == key) {
            // Promote the next survivor, or leave the bucket empty.
            self.first = self.overflow.pop_front();
            removed += 1;
        }
        debug_assert!(self.first.is_some() || self.overflow.is_empty());
        removed
    }

    fn clear(&mut self) -> usize {
        usize::from(self.first.take().is_some()) + self.overflow.clear()
    }

    #[inline]
    fn entries(&self) -> Entries<'_> {
        Entries {
            inline: self.first,
            node: self.overflow.head.as_deref(),
        }
    }

    fn is_empty(&self) -> bool {
        self.first.is_none()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "inline-head")] {
        /// The bucket representation used when none is named explicitly.
        pub type DefaultBucket = InlineBucket;
    } else {
        /// The bucket representation used when none is named explicitly.
        pub type DefaultBucket = LinkedBucket;
    }
}
