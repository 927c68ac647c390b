//! Composable focused access: iso, lens, prism, affine, getter and
//! traversal, represented as one sum type with an explicit composition
//! table.

use std::sync::Arc;

mod finder;

pub use finder::Finder;

type GetFn<S, A> = Arc<dyn Fn(&S) -> A + Send + Sync>;
type GetOptionFn<S, A> = Arc<dyn Fn(&S) -> Option<A> + Send + Sync>;
type SetFn<S, A> = Arc<dyn Fn(&S, A) -> S + Send + Sync>;
type ReverseFn<S, A> = Arc<dyn Fn(&A) -> S + Send + Sync>;
type GetAllFn<S, A> = Arc<dyn Fn(&S) -> Vec<A> + Send + Sync>;
type ModifyFn<S, A> = Arc<dyn Fn(&S, &dyn Fn(&A) -> A) -> S + Send + Sync>;

/// A bijection between `S` and `A`.
pub struct Iso<S, A> {
    get: GetFn<S, A>,
    reverse: ReverseFn<S, A>,
}

/// Total read, total write.
pub struct Lens<S, A> {
    get: GetFn<S, A>,
    set: SetFn<S, A>,
}

/// Partial read (case match), total write.
pub struct Prism<S, A> {
    get_option: GetOptionFn<S, A>,
    reverse_get: ReverseFn<S, A>,
}

/// Partial read, partial write (no-op on miss).
pub struct Affine<S, A> {
    get_option: GetOptionFn<S, A>,
    set: SetFn<S, A>,
}

/// Total read only.
pub struct Getter<S, A> {
    get: GetFn<S, A>,
}

/// Zero or more foci with fold and modify-each.
pub struct Traversal<S, A> {
    get_all: GetAllFn<S, A>,
    modify: ModifyFn<S, A>,
}

macro_rules! impl_optic_clone {
    ($name:ident, $($field:ident),+) => {
        impl<S, A> Clone for $name<S, A> {
            fn clone(&self) -> Self {
                Self {
                    $($field: Arc::clone(&self.$field),)+
                }
            }
        }
    };
}

impl_optic_clone!(Iso, get, reverse);
impl_optic_clone!(Lens, get, set);
impl_optic_clone!(Prism, get_option, reverse_get);
impl_optic_clone!(Affine, get_option, set);
impl_optic_clone!(Getter, get);
impl_optic_clone!(Traversal, get_all, modify);

/// The strength of an [`Optic`], used to pick composition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpticKind {
    /// Bijection.
    Iso,
    /// Total read and write.
    Lens,
    /// Case match with total write.
    Prism,
    /// Partial read and write.
    Affine,
    /// Read only.
    Getter,
    /// Many foci.
    Traversal,
}

/// A composable focused accessor from `S` into `A`.
///
/// Composition yields the weakest common variant: lens after lens is a
/// lens, lens after prism is an affine, and anything after a traversal is
/// a traversal. Compositions that would need a partial *read-only* optic
/// (a getter through a prism, affine or traversal) degrade to a traversal
/// whose `modify` leaves the source untouched.
pub enum Optic<S, A> {
    /// See [`Iso`].
    Iso(Iso<S, A>),
    /// See [`Lens`].
    Lens(Lens<S, A>),
    /// See [`Prism`].
    Prism(Prism<S, A>),
    /// See [`Affine`].
    Affine(Affine<S, A>),
    /// See [`Getter`].
    Getter(Getter<S, A>),
    /// See [`Traversal`].
    Traversal(Traversal<S, A>),
}

impl<S, A> Clone for Optic<S, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Iso(o) => Self::Iso(o.clone()),
            Self::Lens(o) => Self::Lens(o.clone()),
            Self::Prism(o) => Self::Prism(o.clone()),
            Self::Affine(o) => Self::Affine(o.clone()),
            Self::Getter(o) => Self::Getter(o.clone()),
            Self::Traversal(o) => Self::Traversal(o.clone()),
        }
    }
}

fn meet(left: OpticKind, right: OpticKind) -> OpticKind {
    use OpticKind::{
        Affine,
        Getter,
        Iso,
        Lens,
        Prism,
        Traversal,
    };

    match (left, right) {
        (Iso, kind) | (kind, Iso) => kind,
        (Getter, Getter | Lens) | (Lens, Getter) => Getter,
        (Getter, _) | (_, Getter) | (Traversal, _) | (_, Traversal) => Traversal,
        (Lens, Lens) => Lens,
        (Prism, Prism) => Prism,
        (Lens, Prism) | (Prism, Lens) | (Affine, _) | (_, Affine) => Affine,
    }
}

impl<S, A> Optic<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    /// Creates an iso from a bijection.
    pub fn iso(
        get: impl Fn(&S) -> A + Send + Sync + 'static,
        reverse: impl Fn(&A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::Iso(Iso {
            get: Arc::new(get),
            reverse: Arc::new(reverse),
        })
    }

    /// Creates a lens from a total getter and setter.
    pub fn lens(
        get: impl Fn(&S) -> A + Send + Sync + 'static,
        set: impl Fn(&S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::Lens(Lens {
            get: Arc::new(get),
            set: Arc::new(set),
        })
    }

    /// Creates a prism from a case match and a constructor.
    pub fn prism(
        get_option: impl Fn(&S) -> Option<A> + Send + Sync + 'static,
        reverse_get: impl Fn(&A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::Prism(Prism {
            get_option: Arc::new(get_option),
            reverse_get: Arc::new(reverse_get),
        })
    }

    /// Creates an affine from a partial getter and setter.
    pub fn affine(
        get_option: impl Fn(&S) -> Option<A> + Send + Sync + 'static,
        set: impl Fn(&S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::Affine(Affine {
            get_option: Arc::new(get_option),
            set: Arc::new(set),
        })
    }

    /// Creates a read-only getter.
    pub fn getter(get: impl Fn(&S) -> A + Send + Sync + 'static) -> Self {
        Self::Getter(Getter { get: Arc::new(get) })
    }

    /// Creates a traversal from its fold and modify primitives.
    pub fn traversal(
        get_all: impl Fn(&S) -> Vec<A> + Send + Sync + 'static,
        modify: impl Fn(&S, &dyn Fn(&A) -> A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::Traversal(Traversal {
            get_all: Arc::new(get_all),
            modify: Arc::new(modify),
        })
    }

    /// The variant of this optic.
    pub fn kind(&self) -> OpticKind {
        match self {
            Self::Iso(_) => OpticKind::Iso,
            Self::Lens(_) => OpticKind::Lens,
            Self::Prism(_) => OpticKind::Prism,
            Self::Affine(_) => OpticKind::Affine,
            Self::Getter(_) => OpticKind::Getter,
            Self::Traversal(_) => OpticKind::Traversal,
        }
    }

    /// The first focus, if any.
    pub fn get_option(&self, source: &S) -> Option<A> {
        match self {
            Self::Iso(o) => Some((o.get)(source)),
            Self::Lens(o) => Some((o.get)(source)),
            Self::Prism(o) => (o.get_option)(source),
            Self::Affine(o) => (o.get_option)(source),
            Self::Getter(o) => Some((o.get)(source)),
            Self::Traversal(o) => (o.get_all)(source).into_iter().next(),
        }
    }

    /// All foci, in order.
    pub fn get_all(&self, source: &S) -> Vec<A> {
        match self {
            Self::Traversal(o) => (o.get_all)(source),
            _ => self.get_option(source).into_iter().collect(),
        }
    }

    /// Replaces the focus. Partial optics return the source unchanged on a
    /// miss; read-only optics always return it unchanged.
    pub fn set(&self, source: &S, value: A) -> S {
        match self {
            Self::Iso(o) => (o.reverse)(&value),
            Self::Lens(o) => (o.set)(source, value),
            Self::Prism(o) => (o.reverse_get)(&value),
            Self::Affine(o) => match (o.get_option)(source) {
                Some(_) => (o.set)(source, value),
                None => source.clone(),
            },
            Self::Getter(_) => source.clone(),
            Self::Traversal(o) => (o.modify)(source, &move |_| value.clone()),
        }
    }

    /// Applies `f` to every focus.
    pub fn modify(&self, source: &S, f: &dyn Fn(&A) -> A) -> S {
        match self {
            Self::Iso(o) => (o.reverse)(&f(&(o.get)(source))),
            Self::Lens(o) => (o.set)(source, f(&(o.get)(source))),
            Self::Prism(o) => match (o.get_option)(source) {
                Some(value) => (o.reverse_get)(&f(&value)),
                None => source.clone(),
            },
            Self::Affine(o) => match (o.get_option)(source) {
                Some(value) => (o.set)(source, f(&value)),
                None => source.clone(),
            },
            Self::Getter(_) => source.clone(),
            Self::Traversal(o) => (o.modify)(source, f),
        }
    }

    /// Folds over every focus in order.
    pub fn fold<Acc>(&self, source: &S, init: Acc, f: impl FnMut(Acc, A) -> Acc) -> Acc {
        self.get_all(source).into_iter().fold(init, f)
    }

    fn as_iso(&self) -> Option<Iso<S, A>> {
        match self {
            Self::Iso(o) => Some(o.clone()),
            _ => None,
        }
    }

    fn as_lens(&self) -> Option<Lens<S, A>> {
        match self {
            Self::Iso(o) => {
                let reverse = Arc::clone(&o.reverse);
                Some(Lens {
                    get: Arc::clone(&o.get),
                    set: Arc::new(move |_, value| reverse(&value)),
                })
            }
            Self::Lens(o) => Some(o.clone()),
            _ => None,
        }
    }

    fn as_prism(&self) -> Option<Prism<S, A>> {
        match self {
            Self::Iso(o) => {
                let get = Arc::clone(&o.get);
                Some(Prism {
                    get_option: Arc::new(move |source| Some(get(source))),
                    reverse_get: Arc::clone(&o.reverse),
                })
            }
            Self::Prism(o) => Some(o.clone()),
            _ => None,
        }
    }

    fn as_affine(&self) -> Option<Affine<S, A>> {
        match self {
            Self::Iso(_) | Self::Lens(_) => self.as_lens().map(|lens| {
                let get = lens.get;
                Affine {
                    get_option: Arc::new(move |source| Some(get(source))),
                    set: lens.set,
                }
            }),
            Self::Prism(o) => {
                let reverse_get = Arc::clone(&o.reverse_get);
                Some(Affine {
                    get_option: Arc::clone(&o.get_option),
                    set: Arc::new(move |_, value| reverse_get(&value)),
                })
            }
            Self::Affine(o) => Some(o.clone()),
            _ => None,
        }
    }

    fn as_getter(&self) -> Option<Getter<S, A>> {
        match self {
            Self::Iso(o) => Some(Getter {
                get: Arc::clone(&o.get),
            }),
            Self::Lens(o) => Some(Getter {
                get: Arc::clone(&o.get),
            }),
            Self::Getter(o) => Some(o.clone()),
            _ => None,
        }
    }

    fn as_traversal(&self) -> Traversal<S, A> {
        match self {
            Self::Traversal(o) => o.clone(),
            Self::Getter(o) => {
                let get = Arc::clone(&o.get);
                Traversal {
                    get_all: Arc::new(move |source| vec![get(source)]),
                    modify: Arc::new(|source, _| source.clone()),
                }
            }
            _ => {
                let affine = self
                    .as_affine()
                    .expect("every writable optic degrades to an affine");
                let get_option = Arc::clone(&affine.get_option);
                let set = affine.set;
                let reads = Arc::clone(&affine.get_option);
                Traversal {
                    get_all: Arc::new(move |source| reads(source).into_iter().collect()),
                    modify: Arc::new(move |source, f| match get_option(source) {
                        Some(value) => set(source, f(&value)),
                        None => source.clone(),
                    }),
                }
            }
        }
    }

    /// Composes this optic with one focusing deeper.
    ///
    /// The result is the weakest common variant of the two, per the table
    /// on [`Optic`].
    pub fn compose<B>(&self, other: &Optic<A, B>) -> Optic<S, B>
    where
        B: Clone + Send + Sync + 'static,
    {
        match meet(self.kind(), other.kind()) {
            OpticKind::Iso => {
                let (a, b) = (
                    self.as_iso().expect("iso meet requires two isos"),
                    other.as_iso().expect("iso meet requires two isos"),
                );
                let (a_get, a_reverse) = (a.get, a.reverse);
                let (b_get, b_reverse) = (b.get, b.reverse);
                Optic::Iso(Iso {
                    get: Arc::new(move |source| b_get(&a_get(source))),
                    reverse: Arc::new(move |value| a_reverse(&b_reverse(value))),
                })
            }
            OpticKind::Lens => {
                let (a, b) = (
                    self.as_lens().expect("lens meet requires lens-strength"),
                    other.as_lens().expect("lens meet requires lens-strength"),
                );
                let (a_get, a_set) = (a.get, a.set);
                let (b_get, b_set) = (b.get, b.set);
                let a_get2 = Arc::clone(&a_get);
                Optic::Lens(Lens {
                    get: Arc::new(move |source| b_get(&a_get(source))),
                    set: Arc::new(move |source, value| {
                        let focus = a_get2(source);
                        a_set(source, b_set(&focus, value))
                    }),
                })
            }
            OpticKind::Prism => {
                let (a, b) = (
                    self.as_prism().expect("prism meet requires prism-strength"),
                    other.as_prism().expect("prism meet requires prism-strength"),
                );
                let (a_get, a_reverse) = (a.get_option, a.reverse_get);
                let (b_get, b_reverse) = (b.get_option, b.reverse_get);
                Optic::Prism(Prism {
                    get_option: Arc::new(move |source| {
                        a_get(source).and_then(|focus| b_get(&focus))
                    }),
                    reverse_get: Arc::new(move |value| a_reverse(&b_reverse(value))),
                })
            }
            OpticKind::Affine => {
                let (a, b) = (
                    self.as_affine().expect("affine meet requires writability"),
                    other.as_affine().expect("affine meet requires writability"),
                );
                let (a_get, a_set) = (a.get_option, a.set);
                let b_get = b.get_option;
                let b_set = b.set;
                let a_get2 = Arc::clone(&a_get);
                Optic::Affine(Affine {
                    get_option: Arc::new(move |source| {
                        a_get(source).and_then(|focus| b_get(&focus))
                    }),
                    set: Arc::new(move |source, value| match a_get2(source) {
                        Some(focus) => a_set(source, b_set(&focus, value)),
                        None => source.clone(),
                    }),
                })
            }
            OpticKind::Getter => {
                let (a, b) = (
                    self.as_getter().expect("getter meet requires total reads"),
                    other.as_getter().expect("getter meet requires total reads"),
                );
                let (a_get, b_get) = (a.get, b.get);
                Optic::Getter(Getter {
                    get: Arc::new(move |source| b_get(&a_get(source))),
                })
            }
            OpticKind::Traversal => {
                let a = self.as_traversal();
                let b = other.as_traversal();
                let (a_all, a_modify) = (a.get_all, a.modify);
                let (b_all, b_modify) = (b.get_all, b.modify);
                Optic::Traversal(Traversal {
                    get_all: Arc::new(move |source| {
                        a_all(source)
                            .iter()
                            .flat_map(|focus| b_all(focus))
                            .collect()
                    }),
                    modify: Arc::new(move |source, f| {
                        let inner = |focus: &A| b_modify(focus, f);
                        a_modify(source, &inner)
                    }),
                })
            }
        }
    }
}
