uucore::bin!(uu_smaps);
