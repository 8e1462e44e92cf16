//! # View — Iterating Entities by Component Type
//!
//! A view visits every live entity that has all of the requested components:
//!
//! ```text
//! registry.view::<(&Transform, &mut Velocity)>(|entity, (t, v)| {
//!     // ...
//! });
//!
//! 1. Extract the arrays for Transform and Velocity from the registry map.
//! 2. Walk the packed entity list of the FIRST array (Transform).
//! 3. Skip dead entities and entities missing any other component.
//! 4. Call the closure with references into the extracted arrays.
//! 5. Put the arrays back.
//! ```
//!
//! ## Extract/Restore
//!
//! Handing out `&A` and `&mut B` from one `HashMap` at the same time would
//! need unsafe code. Instead each parameter *removes* its array from the map,
//! so the borrow checker sees independent owned values, and puts it back
//! afterwards. A missing array is replaced by an empty one, so a view over an
//! unregistered type simply visits nothing.
//!
//! ## The `ViewParam` Trait
//!
//! `&T` and `&mut T` implement [`ViewParam`]; tuples of params are params too,
//! so `(&A, &mut B, &C)` just works. The first element of a tuple drives the
//! iteration, so put the rarest component first.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{ComponentArray, ComponentStorage};
use super::entity::Entity;

pub(crate) type StorageMap = HashMap<TypeId, Box<dyn ComponentStorage>>;

/// Something a view can fetch per entity.
pub trait ViewParam {
    /// The item yielded per entity.
    type Item<'a>;

    /// Arrays extracted from the registry for the duration of the view.
    type Storage;

    fn type_ids() -> Vec<TypeId>;

    fn extract(map: &mut StorageMap) -> Self::Storage;

    fn restore(storage: Self::Storage, map: &mut StorageMap);

    /// Entities to visit: the packed entity list of the leading array.
    fn lead_entities(storage: &Self::Storage) -> Vec<Entity>;

    fn fetch(storage: &mut Self::Storage, entity: Entity) -> Option<Self::Item<'_>>;
}

fn take_array<T: 'static>(map: &mut StorageMap) -> Box<dyn ComponentStorage> {
    map.remove(&TypeId::of::<T>())
        .unwrap_or_else(|| Box::new(ComponentArray::<T>::new()))
}

fn downcast<T: 'static>(storage: &dyn ComponentStorage) -> &ComponentArray<T> {
    storage
        .as_any()
        .downcast_ref()
        .unwrap_or_else(|| panic!("array type mismatch for `{}`", std::any::type_name::<T>()))
}

fn downcast_mut<T: 'static>(storage: &mut dyn ComponentStorage) -> &mut ComponentArray<T> {
    storage
        .as_any_mut()
        .downcast_mut()
        .unwrap_or_else(|| panic!("array type mismatch for `{}`", std::any::type_name::<T>()))
}

/// Shared read access to a component.
impl<T: 'static> ViewParam for &T {
    type Item<'a> = &'a T;
    type Storage = Box<dyn ComponentStorage>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(map: &mut StorageMap) -> Self::Storage {
        take_array::<T>(map)
    }

    fn restore(storage: Self::Storage, map: &mut StorageMap) {
        map.insert(TypeId::of::<T>(), storage);
    }

    fn lead_entities(storage: &Self::Storage) -> Vec<Entity> {
        storage.entities().to_vec()
    }

    fn fetch(storage: &mut Self::Storage, entity: Entity) -> Option<Self::Item<'_>> {
        downcast::<T>(&**storage).get(entity)
    }
}

/// Exclusive write access to a component.
impl<T: 'static> ViewParam for &mut T {
    type Item<'a> = &'a mut T;
    type Storage = Box<dyn ComponentStorage>;

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(map: &mut StorageMap) -> Self::Storage {
        take_array::<T>(map)
    }

    fn restore(storage: Self::Storage, map: &mut StorageMap) {
        map.insert(TypeId::of::<T>(), storage);
    }

    fn lead_entities(storage: &Self::Storage) -> Vec<Entity> {
        storage.entities().to_vec()
    }

    fn fetch(storage: &mut Self::Storage, entity: Entity) -> Option<Self::Item<'_>> {
        downcast_mut::<T>(&mut **storage).get_mut(entity)
    }
}

macro_rules! impl_view_param_tuple {
    ($First:ident $(, $Rest:ident)*) => {
        impl<$First: ViewParam $(, $Rest: ViewParam)*> ViewParam for ($First, $($Rest,)*) {
            type Item<'a> = ($First::Item<'a>, $($Rest::Item<'a>,)*);
            type Storage = ($First::Storage, $($Rest::Storage,)*);

            fn type_ids() -> Vec<TypeId> {
                [$First::type_ids(), $($Rest::type_ids(),)*].concat()
            }

            fn extract(map: &mut StorageMap) -> Self::Storage {
                ($First::extract(map), $($Rest::extract(map),)*)
            }

            #[allow(non_snake_case)]
            fn restore(storage: Self::Storage, map: &mut StorageMap) {
                let ($First, $($Rest,)*) = storage;
                $First::restore($First, map);
                $($Rest::restore($Rest, map);)*
            }

            fn lead_entities(storage: &Self::Storage) -> Vec<Entity> {
                $First::lead_entities(&storage.0)
            }

            #[allow(non_snake_case)]
            fn fetch(storage: &mut Self::Storage, entity: Entity) -> Option<Self::Item<'_>> {
                let ($First, $($Rest,)*) = storage;
                Some(($First::fetch($First, entity)?, $($Rest::fetch($Rest, entity)?,)*))
            }
        }
    };
}

impl_view_param_tuple!(A);
impl_view_param_tuple!(A, B);
impl_view_param_tuple!(A, B, C);
impl_view_param_tuple!(A, B, C, D);
impl_view_param_tuple!(A, B, C, D, E);
impl_view_param_tuple!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_type_ids_follow_declaration_order() {
        assert_eq!(<(&'static u32,)>::type_ids(), vec![TypeId::of::<u32>()]);
        assert_eq!(
            <(&'static mut f32, &'static u8)>::type_ids(),
            vec![TypeId::of::<f32>(), TypeId::of::<u8>()]
        );
    }
}
