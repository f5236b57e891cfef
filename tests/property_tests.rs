// Property tests for encoding, padding and termination

use memtrace::memory::bytes::decode_ints;
use memtrace::trace;
use proptest::prelude::*;

fn initializer(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

proptest! {
    #[test]
    fn scalar_bytes_are_little_endian(v in any::<i32>()) {
        let result = trace(&format!("int main() {{ int x = {}; }}", v), None);
        let x = result.steps[0].variable("x").unwrap();

        prop_assert_eq!(&x.bytes, &v.to_le_bytes().to_vec());
        prop_assert_eq!(&x.value, &v.to_string());
    }

    #[test]
    fn arrays_are_zero_padded(values in prop::collection::vec(any::<i32>(), 0..8), extra in 0usize..8) {
        let len = (values.len() + extra).max(1);
        let source = format!("int main() {{ int a[{}] = {{{}}}; }}", len, initializer(&values));
        let result = trace(&source, None);
        let a = result.steps[0].variable("a").unwrap();

        let mut expected = values.clone();
        expected.resize(len, 0);
        prop_assert_eq!(decode_ints(&a.bytes), expected);
        prop_assert_eq!(a.size, 4 * len);
    }

    #[test]
    fn element_writes_touch_only_their_slot(len in 1usize..8, index in -4i64..12, value in any::<i32>()) {
        let source = format!("int main() {{ int a[{}]; a[{}] = {}; }}", len, index, value);
        let result = trace(&source, None);
        let before = decode_ints(&result.steps[0].variable("a").unwrap().bytes);
        let after = decode_ints(&result.steps[1].variable("a").unwrap().bytes);

        prop_assert_eq!(after.len(), len);
        if index >= 0 && (index as usize) < len {
            let mut expected = before.clone();
            expected[index as usize] = value;
            prop_assert_eq!(after, expected);
        } else {
            prop_assert_eq!(after, before);
            prop_assert!(result.steps[1].explanation.contains("buffer overflow"));
        }
    }

    #[test]
    fn nothing_after_return_is_traced(before in 0usize..5, after in 0usize..5) {
        let mut body = String::new();
        for i in 0..before {
            body.push_str(&format!("int v{} = {};\n", i, i));
        }
        body.push_str("return 0;\n");
        for i in 0..after {
            body.push_str(&format!("int w{} = {};\n", i, i));
        }

        let result = trace(&format!("int main() {{\n{}}}", body), None);
        prop_assert_eq!(result.steps.len(), before + 1);
        prop_assert!(result.steps.last().unwrap().explanation.contains("program ends"));
    }
}
