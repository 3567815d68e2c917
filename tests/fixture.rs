mod common;

use common::{assert_same_code, count, transform, Kind};

#[test]
fn component_fixture() {
    let out = transform(include_str!("fixtures/component.js"));
    assert_same_code(
        &out,
        r#"
        import _tracker from "tracker";
        import './index.css';
        const onOpen = function () {
            _tracker();
        };
        const onClose = () => {
            _tracker();
        };
        const onSave = () => {
            _tracker({id: 'xxx', value: 'zzz'});
        };
        const onSubmit = () => {
            this._trackerParam = {
                id: 'xxx',
                value: 'zzz'
            };
            _tracker(this._trackerParam);
        };
        function setup() {
            const onReady = () => {
                _tracker();
            };
            function onError() {
                _tracker();
            }
        }
        class Widget {
            constructor() {
                _tracker();
            }
            onShow = () => {
                _tracker();
            };
            onHide = function () {
                _tracker();
            };
        }
        "#,
        Kind::Module,
    );
    assert_eq!(count(&out, "import _tracker"), 1);
}
