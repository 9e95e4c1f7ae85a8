//! # Bag: multi-mapa ordenado
//! src/http/bag.rs
//!
//! Estructura pensada para lidiar con las rarezas de los query parameters,
//! los headers y los campos POST: actúa como un diccionario de valores
//! individuales, pero además conserva la lista completa de valores escritos
//! bajo cada clave, en orden de escritura.
//!
//! Invariante: toda clave presente tiene una lista no vacía cuyo último
//! elemento es la respuesta de `get`.

use std::collections::HashMap;

/// Multi-mapa ordenado de `String` a valores `V` (por defecto `String`).
///
/// # Ejemplo
/// ```
/// use solo_http::http::Bag;
///
/// let mut bag: Bag = Bag::new();
/// bag.set("color", "rojo".to_string());
/// bag.set("color", "azul".to_string());
///
/// assert_eq!(bag.get("color"), Some(&"azul".to_string()));
/// assert_eq!(bag.get_list("color").len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Bag<V = String> {
    /// Claves en orden de primera inserción
    order: Vec<String>,

    /// Clave → todos los valores escritos bajo esa clave, en orden
    values: HashMap<String, Vec<V>>,
}

impl<V> Bag<V> {
    /// Crea un Bag vacío
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Escribe un valor bajo una clave
    ///
    /// El valor pasa a ser la respuesta de `get` y se agrega al final de la
    /// lista que retorna `get_list`.
    pub fn set(&mut self, key: &str, value: V) {
        match self.values.get_mut(key) {
            Some(list) => list.push(value),
            None => {
                self.order.push(key.to_string());
                self.values.insert(key.to_string(), vec![value]);
            }
        }
    }

    /// Obtiene el valor más reciente escrito bajo una clave
    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|list| list.last())
    }

    /// Obtiene todos los valores escritos bajo una clave, en orden de escritura
    ///
    /// Retorna un slice vacío si la clave no existe.
    pub fn get_list(&self, key: &str) -> &[V] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Verifica si la clave está presente
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Elimina una clave por completo (valor individual y lista)
    pub fn remove(&mut self, key: &str) -> Option<Vec<V>> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Escribe varios pares clave/valor de una vez
    pub fn update<K, I>(&mut self, pairs: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.set(key.as_ref(), value);
        }
    }

    /// Itera todos los pares (clave, valor), con claves repetidas para
    /// valores múltiples, en orden de inserción
    pub fn items(&self) -> impl Iterator<Item = (&str, &V)> {
        self.order.iter().flat_map(move |key| {
            self.values[key].iter().map(move |v| (key.as_str(), v))
        })
    }

    /// Cantidad de claves distintas
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Verifica si no hay ninguna clave
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<V> Default for Bag<V> {
    fn default() -> Self {
        Self::new()
    }
}
