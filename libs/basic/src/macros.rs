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

//! Small helper macros.

/// Check whether the first expression equals any of the following ones.
#[macro_export]
macro_rules! IN_SET {
    ($val:expr, $($x:expr),+ $(,)?) => {
        {
            let _v = $val;
            false $(|| _v == $x)+
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn in_set() {
        assert!(IN_SET!(2, 1, 2, 3));
        assert!(!IN_SET!(4, 1, 2, 3));
        assert!(IN_SET!('b', 'a', 'b'));
    }
}
