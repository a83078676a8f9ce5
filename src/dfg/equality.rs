//! Structural equality and hashing of vertices.
//!
//! Two vertices are equal if they have the same kind, result type and kind
//! specific attributes (the value of a constant, the variable and driver
//! offsets of a variable reference) and their operands are pairwise equal.
//! Operand order matters: `a + b` and `b + a` are different.
//!
//! The structural hash is consistent with equality, `a.equals(b)` implies
//! equal hashes, on cyclic graphs too.

use alloc::vec::Vec;

use super::vertex::{Payload, VertexData};
use super::{Context, DType, UserData, Vertex};
use crate::core::graph::scc::{is_cyclic_component, Tarjan};
use crate::core::graph::{Graph, Succs};
use crate::core::utils::Idx;
use crate::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Under comparison, assumed equal until proven otherwise.
    Assumed,
    Equal,
    Distinct,
}

/// Memoized results of [`Vertex::equals`].
///
/// Keep one cache for all comparisons of a pass: shared operands are then
/// compared once, no matter how many pairs reach them. The cache is only
/// valid while the compared vertices are not modified.
#[derive(Default)]
pub struct EqualsCache {
    results: HashMap<(Vertex, Vertex), Outcome>,
    /// Pairs assumed or found equal, in the order they were entered.
    log: Vec<(Vertex, Vertex)>,
}

impl EqualsCache {
    /// Create an empty cache.
    pub fn new() -> Self { Self::default() }

    /// Forget all results.
    pub fn clear(&mut self) {
        self.results.clear();
        self.log.clear();
    }

    /// Number of memoized pairs.
    pub fn len(&self) -> usize { self.results.len() }

    /// Check if nothing is memoized.
    pub fn is_empty(&self) -> bool { self.results.is_empty() }

    /// Drop every positive result entered at or after `mark`, they may rest
    /// on a refuted assumption.
    fn rollback(&mut self, mark: usize) {
        for key in self.log.drain(mark..) {
            if self.results.get(&key) != Some(&Outcome::Distinct) {
                self.results.remove(&key);
            }
        }
    }
}

fn self_equals(a: &VertexData, b: &VertexData) -> bool {
    if a.ty != b.ty || a.dtype != b.dtype {
        return false;
    }
    match (&a.payload, &b.payload) {
        (Payload::Const(a), Payload::Const(b)) => a.value() == b.value(),
        (Payload::Var(a), Payload::Var(b)) => {
            a.var() == b.var() && a.driver_offsets() == b.driver_offsets()
        }
        (Payload::None, Payload::None) => true,
        _ => false,
    }
}

/// A pair of vertices whose operands are being compared.
struct Frame {
    key: (Vertex, Vertex),
    /// Length of the cache log when the pair was entered.
    mark: usize,
    next: usize,
}

impl EqualsCache {
    /// Start comparing `a` and `b`.
    ///
    /// Returns the answer if it is known without looking at the operands.
    /// Otherwise the pair is assumed equal and a frame is pushed.
    fn enter(
        &mut self,
        ctx: &Context,
        frames: &mut Vec<Frame>,
        a: Vertex,
        b: Vertex,
    ) -> Option<bool> {
        if a == b {
            return Some(true);
        }
        let key = (a, b);
        match self.results.get(&key) {
            Some(Outcome::Assumed | Outcome::Equal) => return Some(true),
            Some(Outcome::Distinct) => return Some(false),
            None => {}
        }

        let lhs = ctx.vertex(a);
        let rhs = ctx.vertex(b);
        if !self_equals(lhs, rhs) || lhs.sources.len() != rhs.sources.len() {
            self.results.insert(key, Outcome::Distinct);
            return Some(false);
        }

        frames.push(Frame {
            key,
            mark: self.log.len(),
            next: 0,
        });
        self.results.insert(key, Outcome::Assumed);
        self.log.push(key);
        None
    }

    /// Record the outcome of a pair whose operands were all compared, or
    /// whose first differing operand was found.
    fn leave(&mut self, frame: Frame, equal: bool) {
        if equal {
            self.results.insert(frame.key, Outcome::Equal);
        } else {
            self.rollback(frame.mark);
            self.results.insert(frame.key, Outcome::Distinct);
        }
    }
}

impl Vertex {
    /// Check if two vertices are structurally equal, memoizing in `cache`.
    ///
    /// The comparison keeps its own stack, so arbitrarily deep graphs are
    /// fine.
    pub fn equals(self, ctx: &Context, other: Vertex, cache: &mut EqualsCache) -> bool {
        let mut frames = Vec::new();
        // outcome of the last comparison that finished
        let mut equal = match cache.enter(ctx, &mut frames, self, other) {
            Some(equal) => return equal,
            None => true,
        };
        while let Some(frame) = frames.last_mut() {
            let (a, b) = frame.key;
            if equal && frame.next < a.arity(ctx) {
                let index = frame.next;
                frame.next += 1;
                equal = match (a.source(ctx, index), b.source(ctx, index)) {
                    (None, None) => true,
                    (Some(lhs), Some(rhs)) => {
                        cache.enter(ctx, &mut frames, lhs, rhs).unwrap_or(true)
                    }
                    _ => false,
                };
                continue;
            }
            if let Some(done) = frames.pop() {
                cache.leave(done, equal);
            }
        }
        equal
    }

    /// Check if two vertices are structurally equal, with a throwaway cache.
    pub fn equals_uncached(self, ctx: &Context, other: Vertex) -> bool {
        self.equals(ctx, other, &mut EqualsCache::new())
    }
}

/// A structural hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexHash {
    /// The hash value.
    pub value: u64,
    /// Whether the vertex is on or depends on a combinational cycle, in
    /// which case only its own attributes are hashed.
    pub unbounded: bool,
}

/// Multiplier of the FxHash mixing step.
const SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;

/// Hash of a missing operand.
const NO_SOURCE: u64 = 0x2545_f491_4f6c_dd1d;

#[derive(Clone, Copy)]
struct Mixer(u64);

impl Mixer {
    fn mix(self, value: u64) -> Self { Mixer((self.0.rotate_left(5) ^ value).wrapping_mul(SEED)) }
}

fn self_hash(data: &VertexData) -> Mixer {
    let mut hash = Mixer(0).mix(data.ty as u64);
    hash = match data.dtype {
        DType::Packed { width } => hash.mix(width as u64),
        DType::Array { elem_width, len } => {
            hash.mix(elem_width as u64).mix((len as u64) << 32)
        }
    };
    match &data.payload {
        Payload::Const(payload) => payload
            .value()
            .words()
            .iter()
            .fold(hash, |hash, word| hash.mix(*word)),
        Payload::Var(payload) => payload
            .driver_offsets()
            .iter()
            .fold(hash.mix(payload.var().index() as u64), |hash, offset| {
                hash.mix(*offset as u64)
            }),
        Payload::None => hash,
    }
}

/// The part of the operand graph whose hashes are still missing. Variables
/// are leaves, their drivers do not contribute to their hash.
struct UnhashedCone<'a> {
    ctx: &'a Context,
    user: &'a UserData<VertexHash>,
}

impl Graph for UnhashedCone<'_> {
    type Node = Vertex;

    fn is_empty(&self) -> bool { false }
}

impl Succs for UnhashedCone<'_> {
    fn succs(&self, node: Vertex) -> impl IntoIterator<Item = Vertex> {
        let leaf = node.ty(self.ctx).is_var();
        node.sources(self.ctx)
            .flatten()
            .filter(move |source| !leaf && !self.user.is_current(self.ctx, *source))
    }
}

impl Vertex {
    /// The structural hash of the vertex, cached in `user`.
    ///
    /// Hashes of the whole operand cone are computed and cached on the way.
    ///
    /// # Panics
    ///
    /// Panics if the cone leaves the graph of `user`.
    pub fn structural_hash(self, ctx: &mut Context, user: &mut UserData<VertexHash>) -> VertexHash {
        if let Some(hash) = user.try_get(ctx, self) {
            return *hash;
        }

        // operands come before their sinks
        let (components, cyclic): (Vec<_>, Vec<_>) = {
            let cone = UnhashedCone { ctx, user };
            Tarjan::default()
                .run(&cone, [self])
                .into_iter()
                .map(|component| {
                    let cyclic = is_cyclic_component(&cone, &component);
                    (component, cyclic)
                })
                .unzip()
        };

        for (component, cyclic) in components.into_iter().zip(cyclic) {
            for vertex in component {
                let data = ctx.vertex(vertex);
                let shallow = self_hash(data).mix(data.sources.len() as u64);
                let hash = if cyclic {
                    VertexHash {
                        value: shallow.0,
                        unbounded: true,
                    }
                } else if data.ty.is_var() {
                    VertexHash {
                        value: shallow.0,
                        unbounded: false,
                    }
                } else {
                    let mut full = shallow;
                    let mut unbounded = false;
                    for source in vertex.sources(ctx) {
                        full = match source {
                            Some(source) => {
                                let operand = user.get(ctx, source);
                                unbounded |= operand.unbounded;
                                full.mix(operand.value)
                            }
                            None => full.mix(NO_SOURCE),
                        };
                    }
                    VertexHash {
                        value: if unbounded { shallow.0 } else { full.0 },
                        unbounded,
                    }
                };
                user.set(ctx, vertex, hash);
            }
        }

        *user.get(ctx, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfg::{Bits, DType, Graph, Loc, SourceType, VertexType};

    fn op(ctx: &mut Context, g: Graph, ty: VertexType, sources: &[Vertex]) -> Vertex {
        g.add_op_with(ctx, ty, Loc::default(), DType::packed(8), sources)
            .unwrap()
    }

    fn unconnected(ctx: &mut Context, g: Graph, ty: VertexType, width: u32) -> Vertex {
        g.add_op(ctx, ty, Loc::default(), DType::packed(width)).unwrap()
    }

    fn konst(ctx: &mut Context, g: Graph, value: u64) -> Vertex {
        g.add_const(ctx, Loc::default(), Bits::from_u64(8, value))
    }

    #[test]
    fn test_equals_positional() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let a = konst(&mut ctx, g, 1);
        let b = konst(&mut ctx, g, 2);
        let ab = op(&mut ctx, g, VertexType::Add, &[a, b]);
        let ba = op(&mut ctx, g, VertexType::Add, &[b, a]);
        let ab2 = op(&mut ctx, g, VertexType::Add, &[a, b]);
        let sub = op(&mut ctx, g, VertexType::Sub, &[a, b]);

        let mut cache = EqualsCache::new();
        assert!(ab.equals(&ctx, ab2, &mut cache));
        assert!(!ab.equals(&ctx, ba, &mut cache));
        assert!(!ab.equals(&ctx, sub, &mut cache));
        assert!(!cache.is_empty());
        // memoized answers do not change
        assert!(ab.equals(&ctx, ab2, &mut cache));
        assert!(!ab.equals(&ctx, ba, &mut cache));
    }

    #[test]
    fn test_equals_dtype_and_unconnected() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let a = konst(&mut ctx, g, 1);
        let x = unconnected(&mut ctx, g, VertexType::Not, 8);
        let y = unconnected(&mut ctx, g, VertexType::Not, 8);
        let z = unconnected(&mut ctx, g, VertexType::Not, 4);
        assert!(x.equals_uncached(&ctx, y));
        assert!(!x.equals_uncached(&ctx, z));

        y.relink_source(&mut ctx, 0, a);
        assert!(!x.equals_uncached(&ctx, y));
    }

    #[test]
    fn test_equals_vars() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let va = ctx.declare_var("a", &SourceType::bits(8)).unwrap();
        let vb = ctx.declare_var("b", &SourceType::bits(8)).unwrap();
        let a1 = g.add_var(&mut ctx, Loc::default(), va);
        let a2 = g.add_var(&mut ctx, Loc::new(0, 9), va);
        let b = g.add_var(&mut ctx, Loc::default(), vb);
        assert!(a1.equals_uncached(&ctx, a2));
        assert!(!a1.equals_uncached(&ctx, b));
    }

    #[test]
    fn test_equals_cycles() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        // two separate loops x = ~x and y = ~~y, which unfold to the same
        // infinite expression
        let x = unconnected(&mut ctx, g, VertexType::Not, 8);
        x.relink_source(&mut ctx, 0, x);
        let y0 = unconnected(&mut ctx, g, VertexType::Not, 8);
        let y1 = op(&mut ctx, g, VertexType::Not, &[y0]);
        y0.relink_source(&mut ctx, 0, y1);

        let mut cache = EqualsCache::new();
        assert!(x.equals(&ctx, y0, &mut cache));
        assert!(y0.equals(&ctx, x, &mut cache));

        // a loop that bottoms out is different
        let c = konst(&mut ctx, g, 0);
        let z0 = op(&mut ctx, g, VertexType::Not, &[c]);
        let z1 = op(&mut ctx, g, VertexType::Not, &[z0]);
        assert!(!x.equals_uncached(&ctx, z1));
    }

    #[test]
    fn test_failed_assumption_is_rolled_back() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let c0 = konst(&mut ctx, g, 0);
        let c1 = konst(&mut ctx, g, 1);
        // p = p & c0, q = q & c1: comparing p and q assumes (p, q) while
        // comparing the first operands, then the constants differ
        let p = unconnected(&mut ctx, g, VertexType::And, 8);
        p.relink_source(&mut ctx, 0, p);
        p.relink_source(&mut ctx, 1, c0);
        let q = unconnected(&mut ctx, g, VertexType::And, 8);
        q.relink_source(&mut ctx, 0, q);
        q.relink_source(&mut ctx, 1, c1);
        let wrap_p = op(&mut ctx, g, VertexType::Not, &[p]);
        let wrap_q = op(&mut ctx, g, VertexType::Not, &[q]);

        let mut cache = EqualsCache::new();
        assert!(!p.equals(&ctx, q, &mut cache));
        assert!(!wrap_p.equals(&ctx, wrap_q, &mut cache));
        assert_eq!(cache.results.get(&(p, q)), Some(&Outcome::Distinct));
        assert!(cache
            .results
            .values()
            .all(|outcome| *outcome != Outcome::Assumed));
    }

    #[test]
    fn test_equals_deep_chains() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let c = konst(&mut ctx, g, 0);
        let chain = |ctx: &mut Context, len: usize| {
            (0..len).fold(c, |last, _| op(ctx, g, VertexType::Not, &[last]))
        };
        let a = chain(&mut ctx, 150_000);
        let b = chain(&mut ctx, 150_000);
        let shorter = chain(&mut ctx, 149_999);

        let mut cache = EqualsCache::new();
        assert!(a.equals(&ctx, b, &mut cache));
        assert_eq!(cache.len(), 150_000);
        assert!(!a.equals_uncached(&ctx, shorter));
        assert!(!shorter.equals_uncached(&ctx, b));
    }

    #[test]
    fn test_hash() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let a = konst(&mut ctx, g, 3);
        let b = konst(&mut ctx, g, 4);
        let a2 = konst(&mut ctx, g, 3);
        let b2 = konst(&mut ctx, g, 4);
        let x = op(&mut ctx, g, VertexType::Add, &[a, b]);
        let y = op(&mut ctx, g, VertexType::Add, &[a2, b2]);
        let z = op(&mut ctx, g, VertexType::Add, &[b, a]);

        ctx.user_data_in_use(g, |ctx, user| {
            let hx = x.structural_hash(ctx, user);
            let hy = y.structural_hash(ctx, user);
            let hz = z.structural_hash(ctx, user);
            assert_eq!(hx, hy);
            assert!(!hx.unbounded);
            // not required, but expected of a decent hash
            assert_ne!(hx, hz);
            // operands were cached on the way
            assert!(user.is_current(ctx, a) && user.is_current(ctx, b2));
        });
    }

    #[test]
    fn test_hash_cyclic() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let x = unconnected(&mut ctx, g, VertexType::Not, 8);
        x.relink_source(&mut ctx, 0, x);
        let y0 = unconnected(&mut ctx, g, VertexType::Not, 8);
        let y1 = op(&mut ctx, g, VertexType::Not, &[y0]);
        y0.relink_source(&mut ctx, 0, y1);
        let above_x = op(&mut ctx, g, VertexType::Negate, &[x]);
        let above_y = op(&mut ctx, g, VertexType::Negate, &[y1]);

        assert!(above_x.equals_uncached(&ctx, above_y));
        ctx.user_data_in_use(g, |ctx, user| {
            let hx = above_x.structural_hash(ctx, user);
            let hy = above_y.structural_hash(ctx, user);
            assert!(hx.unbounded);
            assert_eq!(hx, hy);
            assert_eq!(x.structural_hash(ctx, user), y0.structural_hash(ctx, user));
        });
    }

    #[test]
    fn test_hash_stops_at_vars() {
        let mut ctx = Context::new("top");
        let g = Graph::new(&mut ctx, "g");
        let va = ctx.declare_var("a", &SourceType::bits(8)).unwrap();
        // a = ~a through a variable is not a combinational cycle for hashing
        let v = g.add_var(&mut ctx, Loc::default(), va);
        let n = op(&mut ctx, g, VertexType::Not, &[v]);
        v.add_driver(&mut ctx, 0, n);

        ctx.user_data_in_use(g, |ctx, user| {
            let hn = n.structural_hash(ctx, user);
            assert!(!hn.unbounded);
            assert!(!user.get(ctx, v).unbounded);
        });
    }
}
