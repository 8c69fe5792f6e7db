crate::define_id_enum! {
    /// Package namespace a dependency was resolved from
    Forge {
        Golang => "golang",
        Maven => "maven",
        Npmjs => "npmjs",
        Pypi => "pypi",
        Rubygems => "rubygems",
        Nuget => "nuget",
        Centos => "centos",
        Ubuntu => "ubuntu",
        Yocto => "yocto",
    }
}
