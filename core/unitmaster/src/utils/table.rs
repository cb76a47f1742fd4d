// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// unitmaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

pub enum TableOp<'a, K, V> {
    TableInsert(&'a K, &'a V),
    TableRemove(&'a K, &'a V),
}

pub trait TableSubscribe<K, V> {
    fn filter(&self, _op: &TableOp<K, V>) -> bool {
        // default: everything is allowed
        true
    }

    fn notify(&self, op: &TableOp<K, V>);
}

pub struct Table<K, V> {
    data: RefCell<HashMap<K, V>>, // key + value
    subscribers: RefCell<HashMap<String, Rc<dyn TableSubscribe<K, V>>>>, // key: name, value: subscriber
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Table<K, V> {
        Table {
            data: RefCell::new(HashMap::new()),
            subscribers: RefCell::new(HashMap::new()),
        }
    }

    pub fn data_clear(&self) {
        // clear all data without notifying subscribers
        self.data.borrow_mut().clear();
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        // clear all, including data and subscribers
        self.data_clear();
        self.subscribers.borrow_mut().clear();
    }

    pub fn insert(&self, k: K, v: V) -> Option<V> {
        let key = k.clone();
        let ret = self.data.borrow_mut().insert(k, v);
        let value = self.get(&key).expect("something inserted is not found.");
        let op = TableOp::TableInsert(&key, &value);
        self.notify(&op);
        ret
    }

    pub fn remove(&self, k: &K) -> Option<V> {
        let ret = self.data.borrow_mut().remove(k);
        if let Some(v) = &ret {
            let op = TableOp::TableRemove(k, v);
            self.notify(&op);
        }
        ret
    }

    pub fn get(&self, k: &K) -> Option<V> {
        self.data.borrow().get(k).cloned()
    }

    pub fn get_all(&self) -> Vec<V> {
        self.data.borrow().values().cloned().collect::<Vec<V>>()
    }

    pub fn keys(&self) -> Vec<K> {
        self.data.borrow().keys().cloned().collect::<Vec<K>>()
    }

    pub fn subscribe(
        &self,
        name: String,
        subscriber: Rc<dyn TableSubscribe<K, V>>,
    ) -> Option<Rc<dyn TableSubscribe<K, V>>> {
        self.subscribers.borrow_mut().insert(name, subscriber)
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&self, name: &str) -> Option<Rc<dyn TableSubscribe<K, V>>> {
        self.subscribers.borrow_mut().remove(name)
    }

    fn notify(&self, op: &TableOp<'_, K, V>) {
        for (_, subscriber) in self.subscribers.borrow().iter() {
            if subscriber.filter(op) {
                subscriber.notify(op);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn table_insert_get() {
        let table: Table<u32, char> = Table::new();

        let old = table.insert(1, 'a');
        assert_eq!(old, None);

        let old = table.insert(1, 'b');
        assert_eq!(old, Some('a'));

        assert_eq!(table.get(&1), Some('b'));
        assert_eq!(table.get(&2), None);
    }

    #[test]
    fn table_remove() {
        let table: Table<u32, char> = Table::new();

        assert_eq!(table.remove(&1), None);

        table.insert(1, 'a');
        assert_eq!(table.remove(&1), Some('a'));
        assert_eq!(table.get(&1), None);
    }

    #[test]
    fn table_notify() {
        let table: Table<u32, char> = Table::new();
        let sub_test = Rc::new(TableTest::new());

        table.subscribe(String::from("test"), Rc::clone(&sub_test) as Rc<dyn TableSubscribe<u32, char>>);
        table.insert(1, 'a');
        assert_eq!(sub_test.get_key(), Some(1));
        assert_eq!(sub_test.get_value(), Some('a'));
        table.remove(&1);
        assert_eq!(sub_test.get_key(), None);
        assert_eq!(sub_test.get_value(), None);
    }

    struct TableTest {
        key: RefCell<Option<u32>>,
        value: RefCell<Option<char>>,
    }

    impl TableTest {
        fn new() -> TableTest {
            TableTest {
                key: RefCell::new(None),
                value: RefCell::new(None),
            }
        }

        fn get_key(&self) -> Option<u32> {
            *self.key.borrow()
        }

        fn get_value(&self) -> Option<char> {
            *self.value.borrow()
        }
    }

    impl TableSubscribe<u32, char> for TableTest {
        fn notify(&self, op: &TableOp<u32, char>) {
            match op {
                TableOp::TableInsert(k, v) => {
                    *self.key.borrow_mut() = Some(**k);
                    *self.value.borrow_mut() = Some(**v);
                }
                TableOp::TableRemove(_, _) => {
                    *self.key.borrow_mut() = None;
                    *self.value.borrow_mut() = None;
                }
            }
        }
    }
}
