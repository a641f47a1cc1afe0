//! AVL tree backing the connection index.
//!
//! Every mutating operation consumes the subtree it is given and returns the
//! replacement root, since a rotation can change which node sits at the top.
//! Callers hold the root `Link` and thread it through each call; there is no
//! shared mutable root state.
//!
//! Keys are compared as strings, so ordering is lexicographic on the IP text
//! ("192.168.1.10" sorts before "192.168.1.2"). This matches the on-disk
//! ordering and must not be changed to numeric comparison silently.

use chrono::{Duration, NaiveDateTime};
use std::cmp::Ordering;

use super::Entry;

/// An owned subtree, absent when empty.
pub type Link = Option<Box<Node>>;

/// Index node. Height is 1 for a leaf; an absent subtree counts as 0.
#[derive(Debug)]
pub struct Node {
    pub entry: Entry,
    left: Link,
    right: Link,
    height: i32,
}

impl Node {
    fn leaf(ip: &str, now: NaiveDateTime) -> Self {
        Self {
            entry: Entry::new(ip, now),
            left: None,
            right: None,
            height: 1,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance_factor(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.balance_factor())
}

/// Key of a child slot the rebalancing cases have proven non-empty. A missing
/// node here means the balancing logic itself is broken, so fail loudly.
fn key(link: &Link) -> &str {
    link.as_ref()
        .expect("unbalanced node is missing its heavier child")
        .entry
        .ip
        .as_str()
}

/// Right rotation around `y`: its left child becomes the new subtree root.
/// Heights are recomputed demoted node first, promoted node second.
fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let mut x = y.left.take().expect("right rotation without a left child");
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

/// Left rotation around `x`: its right child becomes the new subtree root.
fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let mut y = x.right.take().expect("left rotation without a right child");
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// Insert `ip` seen at `now`, or refresh its timestamp if already present.
/// Returns the new root of the subtree.
pub fn insert(root: Link, ip: &str, now: NaiveDateTime) -> Link {
    let mut node = match root {
        None => return Some(Box::new(Node::leaf(ip, now))),
        Some(node) => node,
    };

    match ip.cmp(node.entry.ip.as_str()) {
        Ordering::Equal => {
            // Known IP: refresh only. Shape and heights are untouched.
            node.entry.last_seen = now;
            return Some(node);
        }
        Ordering::Less => node.left = insert(node.left.take(), ip, now),
        Ordering::Greater => node.right = insert(node.right.take(), ip, now),
    }

    node.update_height();
    let balance = node.balance_factor();

    // Rotation case is picked by where the inserted key landed.
    if balance > 1 {
        if ip < key(&node.left) {
            return Some(rotate_right(node));
        }
        node.left = node.left.take().map(rotate_left);
        return Some(rotate_right(node));
    }
    if balance < -1 {
        if ip > key(&node.right) {
            return Some(rotate_left(node));
        }
        node.right = node.right.take().map(rotate_right);
        return Some(rotate_left(node));
    }

    Some(node)
}

/// Remove `ip` if present; an absent key leaves the tree untouched.
/// Returns the new root of the subtree.
pub fn delete(root: Link, ip: &str) -> Link {
    let mut node = root?;

    match ip.cmp(node.entry.ip.as_str()) {
        Ordering::Less => node.left = delete(node.left.take(), ip),
        Ordering::Greater => node.right = delete(node.right.take(), ip),
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            // Zero or one child: splice the node out.
            (None, child) | (child, None) => return child,
            // Two children: promote the in-order successor's record, then
            // delete that record from the right subtree.
            (left, Some(right)) => {
                let successor = min_entry(&right).clone();
                node.left = left;
                node.right = delete(Some(right), successor.ip.as_str());
                node.entry = successor;
            }
        },
    }

    node.update_height();
    let balance = node.balance_factor();

    // After a delete the removed key may be long gone from this subtree, so
    // the rotation case is picked from the children's own balance factors.
    if balance > 1 {
        if balance_factor(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return Some(rotate_right(node));
    }
    if balance < -1 {
        if balance_factor(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return Some(rotate_left(node));
    }

    Some(node)
}

fn min_entry(node: &Node) -> &Entry {
    let mut current = node;
    while let Some(left) = current.left.as_deref() {
        current = left;
    }
    &current.entry
}

/// Exact lookup, O(height).
pub fn search<'a>(root: &'a Link, ip: &str) -> Option<&'a Entry> {
    let node = root.as_deref()?;
    match ip.cmp(node.entry.ip.as_str()) {
        Ordering::Equal => Some(&node.entry),
        Ordering::Less => search(&node.left, ip),
        Ordering::Greater => search(&node.right, ip),
    }
}

/// Materialized snapshot of all entries in ascending key order.
pub fn inorder(root: &Link) -> Vec<Entry> {
    let mut out = Vec::new();
    collect(root, &mut out);
    out
}

fn collect(link: &Link, out: &mut Vec<Entry>) {
    if let Some(node) = link.as_deref() {
        collect(&node.left, out);
        out.push(node.entry.clone());
        collect(&node.right, out);
    }
}

/// Number of entries in the index.
pub fn size(root: &Link) -> usize {
    root.as_deref()
        .map_or(0, |node| 1 + size(&node.left) + size(&node.right))
}

/// Evict every entry idle for longer than `threshold` as of `now`.
///
/// Snapshot first, delete second: removing nodes while walking the tree would
/// invalidate the traversal as soon as a rotation fires. Evicted IPs come back
/// in ascending key order, which is also the deletion order.
pub fn sweep_expired(
    root: Link,
    now: NaiveDateTime,
    threshold: Duration,
) -> (Link, Vec<String>) {
    let expired: Vec<String> = inorder(&root)
        .into_iter()
        .filter(|entry| now - entry.last_seen > threshold)
        .map(|entry| entry.ip)
        .collect();

    let root = expired.iter().fold(root, |acc, ip| delete(acc, ip));
    (root, expired)
}

/// Check the balance bound and height bookkeeping of every node. Exposed so
/// integration tests can audit the tree after arbitrary operation sequences.
pub fn is_balanced(root: &Link) -> bool {
    fn check(link: &Link) -> Option<i32> {
        let node = match link.as_deref() {
            None => return Some(0),
            Some(node) => node,
        };
        let left = check(&node.left)?;
        let right = check(&node.right)?;
        let expected = 1 + left.max(right);
        if (left - right).abs() > 1 || node.height != expected {
            return None;
        }
        Some(expected)
    }
    check(root).is_some()
}
