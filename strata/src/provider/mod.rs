//! The provider tree.
//!
//! A [`Provider`] is one immutable node: an [`Operator`], its sources and the [`Header`]
//! derived from both at construction time. Nodes are shared through [`ProviderRef`]; rewrites
//! rebuild only the nodes that change and hand back the original `Arc` for the others, so
//! `Arc::ptr_eq` tells whether a sub-tree was touched.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::StrataResult;
use crate::operator::{Operator, OperatorTrait, ProviderKind};

mod builder;
mod explain;
mod header;
mod visit;

pub use builder::*;
pub use explain::*;
pub use header::*;
pub use visit::*;

pub type ProviderRef = Arc<Provider>;

/// Sources of a provider; at most two.
pub type Sources = SmallVec<[ProviderRef; 2]>;

#[derive(Debug)]
pub struct Provider {
    operator: Operator,
    sources: Sources,
    header: Header,
}

impl Provider {
    /// Builds a provider, checking its arity and deriving its header.
    pub fn new<O, I>(operator: O, sources: I) -> StrataResult<ProviderRef>
    where
        O: Into<Operator>,
        I: IntoIterator<Item = ProviderRef>,
    {
        let operator = operator.into();
        let sources: Sources = sources.into_iter().collect();
        if sources.len() != operator.arity() {
            malformed!(
                operator.kind(),
                "expected {} sources, got {}",
                operator.arity(),
                sources.len()
            );
        }
        let header = operator.derive_header(&sources)?;
        Ok(Arc::new(Provider {
            operator,
            sources,
            header,
        }))
    }

    pub fn leaf<O: Into<Operator>>(operator: O) -> StrataResult<ProviderRef> {
        Provider::new(operator, std::iter::empty())
    }

    pub fn unary<O: Into<Operator>>(operator: O, source: ProviderRef) -> StrataResult<ProviderRef> {
        Provider::new(operator, std::iter::once(source))
    }

    pub fn binary<O: Into<Operator>>(
        operator: O,
        left: ProviderRef,
        right: ProviderRef,
    ) -> StrataResult<ProviderRef> {
        Provider::new(operator, [left, right])
    }

    pub fn kind(&self) -> ProviderKind {
        self.operator.kind()
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn sources(&self) -> &[ProviderRef] {
        &self.sources
    }

    pub fn source(&self, idx: usize) -> Option<&ProviderRef> {
        self.sources.get(idx)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Copy-on-write rebuild of `this` with a new operator and new sources.
    ///
    /// Returns `this` itself when the operator is equal and every source is the same `Arc`.
    pub fn rebuild<I>(this: &ProviderRef, operator: Operator, sources: I) -> StrataResult<ProviderRef>
    where
        I: IntoIterator<Item = ProviderRef>,
    {
        let sources: Sources = sources.into_iter().collect();
        let unchanged = operator == this.operator
            && sources.len() == this.sources.len()
            && sources
                .iter()
                .zip(this.sources.iter())
                .all(|(new, old)| Arc::ptr_eq(new, old));
        if unchanged {
            Ok(Arc::clone(this))
        } else {
            Provider::new(operator, sources)
        }
    }

    /// Copy-on-write rebuild of `this` with new sources.
    pub fn with_sources<I>(this: &ProviderRef, sources: I) -> StrataResult<ProviderRef>
    where
        I: IntoIterator<Item = ProviderRef>,
    {
        Provider::rebuild(this, this.operator.clone(), sources)
    }

    /// Number of nodes of the tree rooted here.
    pub fn node_count(&self) -> usize {
        1 + self.sources.iter().map(|s| s.node_count()).sum::<usize>()
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.sources == other.sources
    }
}

impl Eq for Provider {}

/// Structural hash; the header is derived so it is left out.
impl Hash for Provider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator.hash(state);
        self.sources.len().hash(state);
        for s in &self.sources {
            s.hash(state);
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operator)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;

    use super::*;
    use crate::error::StrataError;
    use crate::expr::{col, lit};
    use crate::operator::{Filter, Join, JoinType, Select};
    use crate::test_utils::{customers, orders};

    fn hash_of(p: &Provider) -> u64 {
        let mut hasher = DefaultHasher::new();
        p.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_arity_is_checked() {
        let scan = customers();
        let err = Provider::new(Select::new(vec![0]), vec![scan.clone(), scan]).unwrap_err();
        assert!(matches!(
            err,
            StrataError::Malformed {
                kind: ProviderKind::Select,
                ..
            }
        ));
    }

    #[test]
    fn test_select_rejects_duplicates_and_out_of_range() {
        assert!(Provider::unary(Select::new(vec![0, 0]), customers()).is_err());
        assert!(Provider::unary(Select::new(vec![9]), customers()).is_err());
    }

    #[test]
    fn test_filter_rejects_out_of_range_predicate() {
        let err = Provider::unary(Filter::new(col(10).eq(lit(1i64))), customers()).unwrap_err();
        assert_eq!(
            "malformed Filter: column #10 is out of range for 4 columns",
            err.to_string()
        );
    }

    #[test]
    fn test_rebuild_returns_same_arc_when_unchanged() {
        let filter = Provider::unary(Filter::new(col(1).eq(lit("x"))), customers()).unwrap();
        let same = Provider::with_sources(&filter, filter.sources().to_vec()).unwrap();
        assert!(Arc::ptr_eq(&filter, &same));

        let other = Provider::with_sources(&filter, vec![customers()]).unwrap();
        assert!(!Arc::ptr_eq(&filter, &other));
        assert_eq!(filter, other);
        assert_eq!(hash_of(&filter), hash_of(&other));
    }

    #[test]
    fn test_join_header_length() {
        let join = Provider::binary(
            Join::new(JoinType::Inner, vec![(0, 1)]),
            customers(),
            orders(),
        )
        .unwrap();
        assert_eq!(
            customers().header().len() + orders().header().len(),
            join.header().len()
        );
        assert_eq!(3, join.node_count());
    }
}
