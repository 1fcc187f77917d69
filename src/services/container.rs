//! Process-wide provider container.
//!
//! A small type map: every provider is registered once at startup under a token
//! and resolved by type afterwards. Values are cloned out, so register cheap
//! handles (`Arc`, `EngineHandle`, ...).
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::error::ModuleError;

struct Provider {
    token: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct Container {
    providers: HashMap<TypeId, Provider>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value`; a later registration of the same type replaces it.
    pub fn provide<T>(&mut self, token: &'static str, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let replaced = self.providers.insert(
            TypeId::of::<T>(),
            Provider {
                token,
                value: Box::new(value),
            },
        );
        if let Some(old) = replaced {
            tracing::debug!(token, previous = old.token, "provider replaced");
        }
    }

    pub fn resolve<T>(&self) -> Result<T, ModuleError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.providers
            .get(&TypeId::of::<T>())
            .and_then(|p| p.value.downcast_ref::<T>())
            .cloned()
            .ok_or(ModuleError::MissingProvider(type_name::<T>()))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.providers.values().any(|p| p.token == token)
    }

    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<_> = self.providers.values().map(|p| p.token).collect();
        tokens.sort_unstable();
        tokens
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("tokens", &self.tokens())
            .finish()
    }
}

/// Dependencies a module factory asks for, resolved from the container.
pub trait Inject: Sized {
    fn inject(container: &Container) -> Result<Self, ModuleError>;
}

impl Inject for () {
    fn inject(_container: &Container) -> Result<Self, ModuleError> {
        Ok(())
    }
}

macro_rules! impl_inject_tuple {
    ($($ty:ident),+) => {
        impl<$($ty),+> Inject for ($($ty,)+)
        where
            $($ty: Clone + Send + Sync + 'static,)+
        {
            fn inject(container: &Container) -> Result<Self, ModuleError> {
                Ok(($(container.resolve::<$ty>()?,)+))
            }
        }
    };
}

impl_inject_tuple!(A);
impl_inject_tuple!(A, B);
impl_inject_tuple!(A, B, C);
impl_inject_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Secret(&'static str);

    #[test]
    fn provide_and_resolve_by_type() {
        let mut container = Container::new();
        container.provide("SECRET", Secret("s3cr3t"));
        container.provide("PORT", Arc::new(8080u16));

        assert_eq!(container.resolve::<Secret>().unwrap(), Secret("s3cr3t"));
        assert_eq!(*container.resolve::<Arc<u16>>().unwrap(), 8080);
        assert!(container.contains("SECRET"));
        assert_eq!(container.tokens(), vec!["PORT", "SECRET"]);
    }

    #[test]
    fn missing_provider_names_the_type() {
        let container = Container::new();
        let err = container.resolve::<Secret>().unwrap_err();
        assert!(matches!(err, ModuleError::MissingProvider(name) if name.ends_with("Secret")));
    }

    #[test]
    fn inject_resolves_tuples() {
        let mut container = Container::new();
        container.provide("SECRET", Secret("x"));
        container.provide("PORT", 1u16);

        let (secret, port) = <(Secret, u16)>::inject(&container).unwrap();
        assert_eq!(secret, Secret("x"));
        assert_eq!(port, 1);

        assert!(<(Secret, String)>::inject(&container).is_err());
        assert!(<()>::inject(&container).is_ok());
    }
}
